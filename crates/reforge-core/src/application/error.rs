//! Application layer errors.
//!
//! These errors represent failures in orchestration, not business logic.
//! Business logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// A catalog lookup found nothing.
    #[error("{what} '{id}' not found")]
    NotFound { what: &'static str, id: String },

    /// The catalog cannot be read or written. Fatal to a batch.
    #[error("Template catalog unavailable: {reason}")]
    CatalogUnavailable { reason: String },

    /// A bounded stage ran out of time.
    #[error("{stage} timed out after {secs:.1}s", secs = .after.as_secs_f64())]
    Timeout { stage: &'static str, after: Duration },

    /// The batch deadline passed before the artifact was scheduled.
    #[error("Batch deadline exceeded before scheduling")]
    BatchTimeout,

    /// Generation records are append-only.
    #[error("Generation record '{id}' already exists")]
    DuplicateRecord { id: String },

    /// The artifact source could not enumerate artifacts.
    #[error("Discovery failed at {path}: {reason}")]
    DiscoveryFailed { path: PathBuf, reason: String },

    /// A worker task panicked or was cancelled.
    #[error("Worker task failed: {reason}")]
    Join { reason: String },
}

impl ApplicationError {
    pub fn catalog(reason: impl std::fmt::Display) -> Self {
        Self::CatalogUnavailable {
            reason: reason.to_string(),
        }
    }

    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { what, .. } => vec![
                format!("No {what} with that identifier"),
                "Try: reforge templates to list what the catalog holds".into(),
            ],
            Self::CatalogUnavailable { .. } => vec![
                "Check the catalog path and its permissions".into(),
                "Use --catalog memory to run without persistence".into(),
            ],
            Self::Timeout { .. } | Self::BatchTimeout => vec![
                "Raise regeneration.artifact_timeout_secs or batch_timeout_secs".into(),
                "Or narrow the batch with --priority / --category".into(),
            ],
            Self::DiscoveryFailed { path, .. } => vec![
                format!("Failed to read: {}", path.display()),
                "Check that the root directory exists and is readable".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::DiscoveryFailed { .. } => ErrorCategory::Configuration,
            Self::CatalogUnavailable { .. }
            | Self::Timeout { .. }
            | Self::BatchTimeout
            | Self::DuplicateRecord { .. }
            | Self::Join { .. } => ErrorCategory::Internal,
        }
    }
}
