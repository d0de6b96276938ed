//! Batch report types.
//!
//! A [`BatchSummary`] is the externally visible result of one
//! `run_batch` call. Field names are stable; downstream tooling reads
//! the JSON form.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, config::duration_secs};
use crate::domain::{Category, DomainError, Priority, TemplateId};
use crate::error::ReforgeError;

/// Stable, machine-readable failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    ParseError,
    UnresolvedVariable,
    ValidationFailed,
    Timeout,
    BatchTimeout,
    Internal,
}

impl FailureKind {
    pub fn of(error: &ReforgeError) -> Self {
        match error {
            ReforgeError::Domain(DomainError::ParseError { .. }) => Self::ParseError,
            ReforgeError::Domain(
                DomainError::UnresolvedVariable { .. } | DomainError::UndeclaredPlaceholder { .. },
            ) => Self::UnresolvedVariable,
            ReforgeError::Application(ApplicationError::Timeout { .. }) => Self::Timeout,
            ReforgeError::Application(ApplicationError::BatchTimeout) => Self::BatchTimeout,
            _ => Self::Internal,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "PARSE_ERROR",
            Self::UnresolvedVariable => "UNRESOLVED_VARIABLE",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::Timeout => "TIMEOUT",
            Self::BatchTimeout => "BATCH_TIMEOUT",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failure line in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub artifact: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

/// What happened to a single planned artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "kind", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Rendered and passed validation.
    Validated,
    /// Rendered, but the output failed validation.
    ValidationFailed,
    /// Below the compliance gate; no template was produced.
    BelowGate,
    /// Errored before producing a record.
    Failed(FailureKind),
}

impl ItemOutcome {
    pub fn is_rendered(self) -> bool {
        matches!(self, Self::Validated | Self::ValidationFailed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemReport {
    pub source_path: PathBuf,
    pub name: String,
    pub priority: Priority,
    pub category: Category,
    pub outcome: ItemOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance_score: Option<f64>,
}

/// Aggregate result of one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub validated: usize,
    pub validation_failed: usize,
    pub skipped: usize,
    pub by_category: BTreeMap<String, usize>,
    #[serde(rename = "duration_seconds", with = "duration_secs")]
    pub duration: Duration,
    pub failures: Vec<FailureEntry>,
    pub items: Vec<ItemReport>,
}

impl BatchSummary {
    /// Build the counters from items and failures listed in processing order.
    pub fn tally(items: Vec<ItemReport>, failures: Vec<FailureEntry>, duration: Duration) -> Self {
        let mut summary = Self {
            total: items.len(),
            duration,
            failures,
            ..Self::default()
        };
        for item in &items {
            *summary
                .by_category
                .entry(item.category.as_str().to_string())
                .or_default() += 1;
            match item.outcome {
                ItemOutcome::Validated => summary.validated += 1,
                ItemOutcome::ValidationFailed => summary.validation_failed += 1,
                ItemOutcome::BelowGate => summary.skipped += 1,
                ItemOutcome::Failed(_) => summary.failed += 1,
            }
        }
        summary.succeeded = summary.validated + summary.validation_failed;
        summary.items = items;
        summary
    }

    /// True when nothing failed and every rendered artifact validated.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.validation_failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, category: Category, outcome: ItemOutcome) -> ItemReport {
        ItemReport {
            source_path: PathBuf::from(name),
            name: name.into(),
            priority: Priority::DEFAULT,
            category,
            outcome,
            template_id: None,
            compliance_score: None,
        }
    }

    #[test]
    fn failure_kind_maps_errors() {
        let unresolved: ReforgeError = DomainError::UnresolvedVariable {
            name: "db_path".into(),
        }
        .into();
        assert_eq!(FailureKind::of(&unresolved), FailureKind::UnresolvedVariable);

        let timeout: ReforgeError = ApplicationError::Timeout {
            stage: "regeneration",
            after: Duration::from_secs(30),
        }
        .into();
        assert_eq!(FailureKind::of(&timeout), FailureKind::Timeout);
        assert_eq!(
            FailureKind::of(&ReforgeError::internal("x")),
            FailureKind::Internal
        );
    }

    #[test]
    fn tally_partitions_outcomes() {
        let items = vec![
            item("a.py", Category::Database, ItemOutcome::Validated),
            item("b.py", Category::Database, ItemOutcome::ValidationFailed),
            item("c.py", Category::Utility, ItemOutcome::BelowGate),
            item("d.py", Category::Utility, ItemOutcome::Failed(FailureKind::ParseError)),
        ];
        let summary = BatchSummary::tally(items, Vec::new(), Duration::from_millis(250));

        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.validated, 1);
        assert_eq!(summary.validation_failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.by_category["database"], 2);
        assert_eq!(summary.by_category["utility"], 2);
        assert!(!summary.is_clean());
    }

    #[test]
    fn serializes_with_stable_field_names() {
        let summary = BatchSummary::tally(Vec::new(), Vec::new(), Duration::from_millis(1500));
        let json = serde_json::to_value(&summary).unwrap();
        for field in [
            "total",
            "succeeded",
            "failed",
            "validated",
            "validation_failed",
            "skipped",
            "by_category",
            "duration_seconds",
            "failures",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert_eq!(json["duration_seconds"], 1.5);
    }

    #[test]
    fn failure_entry_uses_screaming_codes() {
        let entry = FailureEntry {
            artifact: "x.py".into(),
            kind: FailureKind::BatchTimeout,
            message: "Batch deadline exceeded before scheduling".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "BATCH_TIMEOUT");
    }
}
