//! Deterministic functional categorization.
//!
//! The rule table is evaluated top to bottom and the first matching rule
//! wins. Filename rules come first, then rules on a bounded content prefix,
//! then rules on analysis tags. When several keyword groups would match, the
//! earlier one decides; ambiguity is never reported.

use crate::domain::{
    entities::{AnalysisResult, Artifact},
    value_objects::Category,
};

/// Bytes of content the content rules look at.
pub const CONTENT_PREFIX_BYTES: usize = 2048;

/// Input the rules are evaluated against, precomputed once.
#[derive(Debug)]
pub struct RuleInput<'a> {
    /// Lower-cased file name split on non-alphanumerics.
    pub name_tokens: Vec<String>,
    /// Lower-cased first [`CONTENT_PREFIX_BYTES`] of the content.
    pub content_prefix: String,
    pub analysis: Option<&'a AnalysisResult>,
    pub is_config: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    /// A file name token starting with any keyword.
    NameToken(&'static [&'static str]),
    /// A file name token starting with `step` followed by a digit.
    StepNumber,
    /// The content prefix contains any keyword.
    Content(&'static [&'static str]),
    /// The analysis carries the tag.
    Tag(&'static str),
    ConfigArtifact,
}

impl Predicate {
    pub fn matches(&self, input: &RuleInput<'_>) -> bool {
        match self {
            Self::NameToken(keywords) => input
                .name_tokens
                .iter()
                .any(|t| keywords.iter().any(|k| t.starts_with(k))),
            Self::StepNumber => input.name_tokens.iter().any(|t| {
                t.strip_prefix("step")
                    .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
            }),
            Self::Content(keywords) => keywords.iter().any(|k| input.content_prefix.contains(k)),
            Self::Tag(tag) => input.analysis.is_some_and(|a| a.has_tag(tag)),
            Self::ConfigArtifact => input.is_config,
        }
    }

    pub const fn is_name_rule(&self) -> bool {
        matches!(self, Self::NameToken(_) | Self::StepNumber)
    }
}

pub const RULES: &[(Predicate, Category)] = &[
    // ========================================================================
    // Filename
    // ========================================================================
    (Predicate::StepNumber, Category::FrameworkStep),
    (Predicate::NameToken(&["orchestrator", "master"]), Category::FrameworkOrchestrator),
    (
        Predicate::NameToken(&["db", "database", "migration", "query", "sql"]),
        Category::Database,
    ),
    (
        Predicate::NameToken(&["validat", "test", "check", "verify"]),
        Category::Validation,
    ),
    (
        Predicate::NameToken(&["analy", "report", "metrics", "stats"]),
        Category::Analytics,
    ),
    (
        Predicate::NameToken(&["deploy", "setup", "install", "release"]),
        Category::Deployment,
    ),
    (
        Predicate::NameToken(&["monitor", "health", "alert", "watch"]),
        Category::Monitoring,
    ),
    (
        Predicate::NameToken(&["config", "settings", "conf", "env", "properties"]),
        Category::Configuration,
    ),
    (
        Predicate::NameToken(&["util", "helper", "tool", "clean"]),
        Category::Utility,
    ),
    (
        Predicate::NameToken(&["web", "api", "server", "http", "client"]),
        Category::WebApi,
    ),
    // ========================================================================
    // Content prefix
    // ========================================================================
    (
        Predicate::Content(&["sqlite3", "sqlalchemy", "create table"]),
        Category::Database,
    ),
    (Predicate::Content(&["unittest", "pytest"]), Category::Validation),
    (
        Predicate::Content(&["flask", "fastapi", "django", "requests"]),
        Category::WebApi,
    ),
    // ========================================================================
    // Analysis tags
    // ========================================================================
    (Predicate::Tag("ENTERPRISE_COMPLIANCE"), Category::EnterpriseCompliance),
    (Predicate::Tag("PERFORMANCE_MONITORING"), Category::Monitoring),
    (Predicate::ConfigArtifact, Category::Configuration),
];

/// Stateless rule-table categorizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternCategorizer;

impl PatternCategorizer {
    pub fn categorize(&self, artifact: &Artifact, analysis: &AnalysisResult) -> Category {
        Self::first_match(&Self::input(artifact, Some(analysis)), |_| true)
    }

    /// Filename rules only; used when analysis failed or timed out.
    pub fn categorize_by_name(&self, artifact: &Artifact) -> Category {
        Self::first_match(&Self::input(artifact, None), Predicate::is_name_rule)
    }

    fn first_match(input: &RuleInput<'_>, eligible: impl Fn(&Predicate) -> bool) -> Category {
        RULES
            .iter()
            .filter(|(predicate, _)| eligible(predicate))
            .find(|(predicate, _)| predicate.matches(input))
            .map(|(_, category)| *category)
            .unwrap_or_default()
    }

    fn input<'a>(artifact: &Artifact, analysis: Option<&'a AnalysisResult>) -> RuleInput<'a> {
        let name = artifact.name().to_lowercase();
        let name_tokens = name
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let mut end = artifact.raw_content.len().min(CONTENT_PREFIX_BYTES);
        while !artifact.raw_content.is_char_boundary(end) {
            end -= 1;
        }

        RuleInput {
            name_tokens,
            content_prefix: artifact.raw_content[..end].to_lowercase(),
            analysis,
            is_config: !artifact.kind.is_script(),
        }
    }
}
