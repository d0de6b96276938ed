//! Unified error handling for Reforge Core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

pub use crate::domain::ErrorCategory;

/// Root error type for Reforge Core operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReforgeError {
    /// Errors from the domain layer (parse, template and policy violations).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Errors from the application layer (orchestration failures).
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl ReforgeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Run: reforge config show to inspect the effective configuration".into(),
            ],
            Self::Internal { .. } => vec![
                "This appears to be a bug in Reforge".into(),
                "Re-run with -vvv and include the log when reporting it".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => e.category(),
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Application(
                ApplicationError::CatalogUnavailable { .. }
                    | ApplicationError::Timeout { .. }
                    | ApplicationError::BatchTimeout
            )
        )
    }

    /// Whether this error must abort a whole batch rather than one artifact.
    pub fn is_fatal_to_batch(&self) -> bool {
        matches!(
            self,
            Self::Application(ApplicationError::CatalogUnavailable { .. })
                | Self::Configuration { .. }
        )
    }
}

/// Convenient result type alias.
pub type ReforgeResult<T> = Result<T, ReforgeError>;

/// Extension trait for adding context to errors.
pub trait Context<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> ReforgeResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> ReforgeResult<T> {
        self.map_err(|e| ReforgeError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}
