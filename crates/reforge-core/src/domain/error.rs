// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (they travel inside batch reports)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Analysis Errors
    // ========================================================================
    #[error("{path}:{line}:{column}: cannot parse as {grammar}: {message}")]
    ParseError {
        path: String,
        grammar: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unsupported artifact '{path}': {reason}")]
    UnsupportedArtifact { path: String, reason: String },

    // ========================================================================
    // Template Errors
    // ========================================================================
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Placeholder '${{{name}}}' is not declared in the variable schema")]
    UndeclaredPlaceholder { name: String },

    #[error("Unresolved variable '{name}'")]
    UnresolvedVariable { name: String },

    // ========================================================================
    // Policy / Input Errors
    // ========================================================================
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid environment context: {0}")]
    InvalidEnvironment(String),

    #[error("Unknown category '{0}'")]
    UnknownCategory(String),
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ParseError { path, grammar, .. } => vec![
                format!("'{}' is not valid {}", path, grammar),
                "Fix the syntax error or exclude the file from discovery".into(),
            ],
            Self::UnsupportedArtifact { path, .. } => vec![
                format!("Skipping: {}", path),
                "Supported: .py scripts and .ini/.cfg/.conf/.env/.properties/.json/.yaml/.yml/.toml configs".into(),
            ],
            Self::UnresolvedVariable { name } => vec![
                format!("Bind '{}' in the environment context", name),
                "Or declare a default for it in the template's variable schema".into(),
            ],
            Self::UndeclaredPlaceholder { name } => vec![
                format!("Add '{}' to the template's variable schema", name),
                "Escape a literal '${' as '$${'".into(),
            ],
            Self::InvalidPolicy(msg) => vec![
                "Check the regeneration policy in your configuration".into(),
                format!("Details: {}", msg),
            ],
            Self::UnknownCategory(_) => vec![
                "Try: reforge templates to see categories in use".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ParseError { .. } | Self::UnsupportedArtifact { .. } => ErrorCategory::Parse,
            Self::InvalidTemplate(_)
            | Self::UndeclaredPlaceholder { .. }
            | Self::UnresolvedVariable { .. }
            | Self::InvalidEnvironment(_) => ErrorCategory::Validation,
            Self::InvalidPolicy(_) => ErrorCategory::Configuration,
            Self::UnknownCategory(_) => ErrorCategory::NotFound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Validation,
    NotFound,
    Configuration,
    Internal,
}
