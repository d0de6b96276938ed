//! Analysis results and the compliance checklist.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{
    entities::common::ContentHash,
    error::DomainError,
    value_objects::{ArtifactKind, Category},
};

// ============================================================================
// Compliance Signals
// ============================================================================

/// One of the ten fixed quality signals of the compliance checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Logging,
    ErrorHandling,
    Docstring,
    TypeAnnotations,
    EntryGuard,
    Header,
    ExternalConfig,
    Persistence,
    Progress,
    PathAbstraction,
}

impl Signal {
    pub const ALL: [Signal; 10] = [
        Signal::Logging,
        Signal::ErrorHandling,
        Signal::Docstring,
        Signal::TypeAnnotations,
        Signal::EntryGuard,
        Signal::Header,
        Signal::ExternalConfig,
        Signal::Persistence,
        Signal::Progress,
        Signal::PathAbstraction,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Logging => "logging",
            Self::ErrorHandling => "error_handling",
            Self::Docstring => "docstring",
            Self::TypeAnnotations => "type_annotations",
            Self::EntryGuard => "entry_guard",
            Self::Header => "header",
            Self::ExternalConfig => "external_config",
            Self::Persistence => "persistence",
            Self::Progress => "progress",
            Self::PathAbstraction => "path_abstraction",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weight of each compliance signal. Must sum to exactly 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceWeights {
    pub logging: u8,
    pub error_handling: u8,
    pub docstring: u8,
    pub type_annotations: u8,
    pub entry_guard: u8,
    pub header: u8,
    pub external_config: u8,
    pub persistence: u8,
    pub progress: u8,
    pub path_abstraction: u8,
}

impl Default for ComplianceWeights {
    fn default() -> Self {
        Self {
            logging: 10,
            error_handling: 15,
            docstring: 15,
            type_annotations: 10,
            entry_guard: 10,
            header: 5,
            external_config: 10,
            persistence: 5,
            progress: 10,
            path_abstraction: 10,
        }
    }
}

impl ComplianceWeights {
    pub const fn weight(&self, signal: Signal) -> u8 {
        match signal {
            Signal::Logging => self.logging,
            Signal::ErrorHandling => self.error_handling,
            Signal::Docstring => self.docstring,
            Signal::TypeAnnotations => self.type_annotations,
            Signal::EntryGuard => self.entry_guard,
            Signal::Header => self.header,
            Signal::ExternalConfig => self.external_config,
            Signal::Persistence => self.persistence,
            Signal::Progress => self.progress,
            Signal::PathAbstraction => self.path_abstraction,
        }
    }

    pub fn total(&self) -> u32 {
        Signal::ALL.iter().map(|s| u32::from(self.weight(*s))).sum()
    }

    /// Reject weight tables that do not sum to 100.
    pub fn validate(&self) -> Result<(), DomainError> {
        let total = self.total();
        if total != 100 {
            return Err(DomainError::InvalidPolicy(format!(
                "compliance weights must sum to 100, got {total}"
            )));
        }
        Ok(())
    }

    /// Score a set of passed signals.
    pub fn score(&self, passed: impl Fn(Signal) -> bool) -> ComplianceReport {
        let checks: Vec<SignalCheck> = Signal::ALL
            .iter()
            .map(|&signal| SignalCheck {
                signal,
                passed: passed(signal),
                weight: self.weight(signal),
            })
            .collect();

        let score = checks
            .iter()
            .filter(|c| c.passed)
            .map(|c| f64::from(c.weight))
            .sum::<f64>()
            .min(100.0);

        ComplianceReport { checks, score }
    }
}

/// Outcome of one checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCheck {
    pub signal: Signal,
    pub passed: bool,
    pub weight: u8,
}

/// Per-signal breakdown of a compliance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ComplianceReport {
    pub checks: Vec<SignalCheck>,
    pub score: f64,
}

impl ComplianceReport {
    pub fn passed(&self, signal: Signal) -> bool {
        self.checks.iter().any(|c| c.signal == signal && c.passed)
    }

    pub fn missing(&self) -> impl Iterator<Item = Signal> + '_ {
        self.checks.iter().filter(|c| !c.passed).map(|c| c.signal)
    }
}

// ============================================================================
// Structural Facts
// ============================================================================

/// Raw structural facts extracted by the inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StructuralFacts {
    pub max_nesting_depth: usize,
    pub exception_handler_count: usize,
    pub import_count: usize,
    pub has_error_handling: bool,
    pub has_logging: bool,
    pub has_documentation: bool,
    pub has_entry_guard: bool,
}

// ============================================================================
// Analysis Result
// ============================================================================

/// Everything the inspector learned about one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub source_path: PathBuf,
    pub content_hash: ContentHash,
    pub kind: ArtifactKind,
    /// Structural and domain pattern tags, sorted and de-duplicated.
    pub pattern_tags: Vec<String>,
    /// Base module names in first-seen order.
    pub dependencies: Vec<String>,
    pub functions: Vec<String>,
    pub classes: Vec<String>,
    pub facts: StructuralFacts,
    pub complexity_score: f64,
    pub compliance: ComplianceReport,
    pub compliance_score: f64,
    pub category: Category,
}

impl AnalysisResult {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.pattern_tags.iter().any(|t| t == tag)
    }

    /// Domain tags are the upper-case ones (`DATABASE_INTEGRATION`, ...).
    pub fn domain_tags(&self) -> impl Iterator<Item = &str> {
        self.pattern_tags
            .iter()
            .map(String::as_str)
            .filter(|t| !t.contains(':') && t.chars().all(|c| c.is_ascii_uppercase() || c == '_'))
    }

    /// Re-point a memoised analysis at another artifact with the same content.
    pub fn for_path(&self, source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            ..self.clone()
        }
    }
}
