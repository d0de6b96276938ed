//! Parsers for the grammars artifacts are declared in.
//!
//! Both the inspector (analysis time) and the syntax validator (after
//! rendering) go through these functions, so "parses" means the same thing
//! on both sides of the pipeline.

pub mod config;
pub mod python;

use std::fmt;

use crate::domain::{entities::Diagnostic, error::DomainError, value_objects::ArtifactKind};

/// A syntax problem at a 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl SyntaxIssue {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }

    /// Locate a byte offset inside `source`.
    pub fn at_offset(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_col(source, offset);
        Self::new(line, column, message)
    }

    pub fn into_parse_error(self, path: &str, kind: ArtifactKind) -> DomainError {
        DomainError::ParseError {
            path: path.to_string(),
            grammar: grammar_name(kind).to_string(),
            line: self.line,
            column: self.column,
            message: self.message,
        }
    }
}

impl From<SyntaxIssue> for Diagnostic {
    fn from(issue: SyntaxIssue) -> Self {
        Diagnostic::at(issue.line, issue.column, issue.message)
    }
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

pub fn grammar_name(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Script => "python",
        ArtifactKind::Config(format) => format.as_str(),
    }
}

/// Check `content` against the grammar of `kind`, collecting every issue.
pub fn check(kind: ArtifactKind, content: &str) -> Vec<SyntaxIssue> {
    match kind {
        ArtifactKind::Script => match python::parse(content) {
            Ok(tree) => python::syntax_issues(tree.root_node()),
            Err(issue) => vec![issue],
        },
        ArtifactKind::Config(format) => match config::parse(format, content) {
            Ok(_) => Vec::new(),
            Err(issues) => issues,
        },
    }
}

fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
        + 1;
    (line, column)
}
