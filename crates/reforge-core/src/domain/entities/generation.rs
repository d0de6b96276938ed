use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{environment::RenderedContent, template::TemplateId};

/// One validator finding. Positions are 1-based when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn at(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            column: Some(column),
            message: message.into(),
        }
    }

    pub fn on_line(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            column: None,
            message: message.into(),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            line: None,
            column: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(l), Some(c)) => write!(f, "{l}:{c}: {}", self.message),
            (Some(l), None) => write!(f, "{l}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub passed: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationOutcome {
    /// Passed iff there are no diagnostics.
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            passed: diagnostics.is_empty(),
            diagnostics,
        }
    }

    pub fn pass() -> Self {
        Self::from_diagnostics(Vec::new())
    }

    /// Diagnostics joined into one line for reports.
    pub fn summary(&self) -> String {
        self.diagnostics
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Immutable, append-only record of one regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation_id: Uuid,
    pub template_id: TemplateId,
    pub environment_name: String,
    pub source_path: PathBuf,
    pub rendered_content: String,
    pub validation_outcome: ValidationOutcome,
    pub generated_at: DateTime<Utc>,
}

impl GenerationRecord {
    /// Stamp a fresh id and timestamp on a rendered, validated result.
    pub fn new(
        rendered: RenderedContent,
        source_path: impl Into<PathBuf>,
        validation_outcome: ValidationOutcome,
    ) -> Self {
        Self {
            generation_id: Uuid::new_v4(),
            template_id: rendered.template_id,
            environment_name: rendered.environment_name,
            source_path: source_path.into(),
            rendered_content: rendered.content,
            validation_outcome,
            generated_at: Utc::now(),
        }
    }

    /// Record ordering: oldest first, ties by id.
    pub fn chronological(a: &Self, b: &Self) -> std::cmp::Ordering {
        a.generated_at
            .cmp(&b.generated_at)
            .then_with(|| a.generation_id.cmp(&b.generation_id))
    }
}
