//! CLI error type: one enum for everything a command can fail with, each
//! variant carrying its exit code and follow-up suggestions.

use std::error::Error;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use thiserror::Error;

use reforge_core::error::{ErrorCategory as CoreCategory, ReforgeError};

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// A file or directory named on the command line does not exist.
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Core(#[from] ReforgeError),

    /// The batch ran to completion but some artifacts failed.
    #[error("{failed} of {total} artifacts did not regenerate cleanly")]
    BatchFailures { failed: usize, total: usize },

    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::IoError {
            message: err.to_string(),
            source: err,
        }
    }
}

/// How the process exits for a given failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Internal,
    Usage,
    NotFound,
    Configuration,
    BatchFailures,
}

impl ExitKind {
    pub fn code(self) -> u8 {
        match self {
            Self::Internal => 1,
            Self::Usage => 2,
            Self::NotFound => 3,
            Self::Configuration => 4,
            Self::BatchFailures => 5,
        }
    }
}

impl CliError {
    pub fn config(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        let source: anyhow::Error = source.into();
        Self::ConfigError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> ExitKind {
        match self {
            Self::FileNotFound { .. } => ExitKind::NotFound,
            Self::ConfigError { .. } => ExitKind::Configuration,
            Self::BatchFailures { .. } => ExitKind::BatchFailures,
            Self::IoError { .. } => ExitKind::Internal,
            Self::Core(core) => match core.category() {
                CoreCategory::Parse | CoreCategory::Validation => ExitKind::Usage,
                CoreCategory::NotFound => ExitKind::NotFound,
                CoreCategory::Configuration => ExitKind::Configuration,
                CoreCategory::Internal => ExitKind::Internal,
            },
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.kind().code()
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FileNotFound { path } => vec![
                format!("Check that '{}' exists and is readable", path.display()),
                "Relative paths resolve against the current directory".into(),
            ],
            Self::ConfigError { .. } => vec![
                "Check the file printed by 'reforge config path'".into(),
                "Inspect the merged settings with 'reforge config show'".into(),
                "Environment overrides use REFORGE_<SECTION>__<KEY>".into(),
            ],
            Self::Core(core) => core.suggestions(),
            Self::BatchFailures { .. } => vec![
                "Each failed artifact is listed under 'Failures' with its code".into(),
                "Re-run with -v to trace the failing stage".into(),
                "Use --output-format json for a machine-readable report".into(),
            ],
            Self::IoError { .. } => vec!["Check permissions on the catalog and log paths".into()],
        }
    }

    /// Message, optional cause chain, suggestions. ANSI styling only when
    /// `color` is set.
    pub fn render(&self, verbose: bool, color: bool) -> String {
        let paint = |text: String, style: fn(&str) -> String| {
            if color { style(&text) } else { text }
        };

        let mut out = format!(
            "\n{}\n",
            paint(format!("Error: {self}"), |s| s.red().bold().to_string())
        );

        if verbose {
            let mut cause = self.source();
            while let Some(err) = cause {
                out.push_str(&paint(format!("  caused by: {err}"), |s| {
                    s.dimmed().to_string()
                }));
                out.push('\n');
                cause = err.source();
            }
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            out.push('\n');
            out.push_str(&paint("Suggestions:".into(), |s| s.yellow().bold().to_string()));
            out.push('\n');
            for suggestion in &suggestions {
                out.push_str(&format!("  - {suggestion}\n"));
            }
        }

        if !verbose {
            out.push('\n');
            out.push_str(&paint("Use -v / --verbose for more details.".into(), |s| {
                s.dimmed().to_string()
            }));
            out.push('\n');
        }
        out
    }

    pub fn log(&self) {
        match self.kind() {
            ExitKind::Usage | ExitKind::NotFound | ExitKind::BatchFailures => {
                tracing::warn!(code = self.exit_code(), "{self}");
            }
            ExitKind::Configuration | ExitKind::Internal => {
                tracing::error!(code = self.exit_code(), "{self}");
            }
        }
        if let Some(source) = self.source() {
            tracing::debug!(%source, "caused by");
        }
    }
}

/// Attach a description to a failed `io::Result`.
pub trait IntoCli<T> {
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IntoCli<T> for Result<T, std::io::Error> {
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| CliError::IoError {
            message: f().into(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reforge_core::{application::ApplicationError, domain::DomainError};
    use std::io;

    #[test]
    fn exit_codes_follow_kinds() {
        assert_eq!(
            CliError::FileNotFound {
                path: PathBuf::from("missing.py")
            }
            .exit_code(),
            3
        );
        assert_eq!(CliError::config("bad", anyhow::anyhow!("boom")).exit_code(), 4);
        assert_eq!(
            CliError::BatchFailures {
                failed: 1,
                total: 3
            }
            .exit_code(),
            5
        );
        assert_eq!(CliError::from(io::Error::other("disk")).exit_code(), 1);
    }

    #[test]
    fn core_errors_map_through_their_category() {
        let parse = CliError::from(ReforgeError::from(DomainError::ParseError {
            path: "a.py".into(),
            grammar: "python".into(),
            line: 1,
            column: 4,
            message: "invalid syntax".into(),
        }));
        assert_eq!(parse.kind(), ExitKind::Usage);

        let missing = CliError::from(ReforgeError::from(ApplicationError::NotFound {
            what: "template",
            id: "x".into(),
        }));
        assert_eq!(missing.exit_code(), 3);

        let unavailable = CliError::from(ReforgeError::from(ApplicationError::CatalogUnavailable {
            reason: "locked".into(),
        }));
        assert_eq!(unavailable.exit_code(), 1);
    }

    #[test]
    fn core_suggestions_are_passed_through() {
        let core = || {
            ReforgeError::from(DomainError::UnresolvedVariable {
                name: "db_path".into(),
            })
        };
        assert_eq!(CliError::from(core()).suggestions(), core().suggestions());
    }

    #[test]
    fn plain_render_has_header_and_hint() {
        let err = CliError::BatchFailures {
            failed: 2,
            total: 5,
        };
        let s = err.render(false, false);
        assert!(s.contains("Error: 2 of 5 artifacts"));
        assert!(s.contains("Suggestions:"));
        assert!(s.contains("--verbose"));
        assert!(!s.contains('\u{1b}'));
    }

    #[test]
    fn verbose_render_lists_causes() {
        let err = CliError::config("bad file", anyhow::anyhow!("line 3"));
        let s = err.render(true, false);
        assert!(s.contains("caused by: line 3"));
        assert!(!s.contains("Use -v"));
    }

    #[test]
    fn io_context_is_kept() {
        let result: Result<(), io::Error> = Err(io::Error::new(io::ErrorKind::NotFound, "missing"));
        let cli: CliResult<()> = result.with_cli_context(|| "reading input");
        assert!(
            matches!(cli, Err(CliError::IoError { ref message, .. }) if message == "reading input")
        );
    }
}
