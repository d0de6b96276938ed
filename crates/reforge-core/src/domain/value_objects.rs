//! Value objects: artifact kinds, config formats, categories and variable types.
//!
//! All of these are small `Copy` enums with stable string forms. The string
//! forms are part of the persisted catalog format and of the batch report,
//! so changing one is a breaking change.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

// ============================================================================
// Config Format
// ============================================================================

/// Grammar of a configuration artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigFormat {
    /// `[section]` headers and `key=value` lines.
    Ini,
    /// `key=value` lines, optional `export` prefix.
    Env,
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub const ALL: &'static [ConfigFormat] = &[
        ConfigFormat::Ini,
        ConfigFormat::Env,
        ConfigFormat::Json,
        ConfigFormat::Yaml,
        ConfigFormat::Toml,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ini => "ini",
            Self::Env => "env",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }

    /// Line-oriented formats must satisfy the `key=value` rule line by line.
    pub const fn is_line_oriented(self) -> bool {
        matches!(self, Self::Ini | Self::Env)
    }

    /// Formats whose values carry a type (numbers, booleans, nesting).
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json | Self::Yaml | Self::Toml)
    }

    /// Map a file extension (without the dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ini" | "cfg" | "conf" => Some(Self::Ini),
            "env" | "properties" => Some(Self::Env),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| DomainError::UnsupportedArtifact {
            path: s.to_string(),
            reason: "unknown config format".into(),
        })
    }
}

// ============================================================================
// Artifact Kind
// ============================================================================

/// What grammar an artifact is parsed and validated under.
///
/// Scripts are Python sources. Configs carry their concrete format so that
/// a rendered template can be validated without going back to the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Script,
    Config(ConfigFormat),
}

impl ArtifactKind {
    /// Infer the kind from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        // `.env` files have no stem, so `extension()` returns None for them.
        let file_name = path.file_name()?.to_str()?;
        if file_name.eq_ignore_ascii_case(".env") {
            return Some(Self::Config(ConfigFormat::Env));
        }

        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("py") {
            return Some(Self::Script);
        }
        ConfigFormat::from_extension(ext).map(Self::Config)
    }

    pub const fn is_script(self) -> bool {
        matches!(self, Self::Script)
    }

    pub const fn config_format(self) -> Option<ConfigFormat> {
        match self {
            Self::Script => None,
            Self::Config(format) => Some(format),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script => f.write_str("script"),
            Self::Config(format) => write!(f, "config:{format}"),
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.split_once(':') {
            None if lower == "script" => Ok(Self::Script),
            Some(("config", format)) => format.parse().map(Self::Config),
            _ => Err(DomainError::UnsupportedArtifact {
                path: s.to_string(),
                reason: "expected 'script' or 'config:<format>'".into(),
            }),
        }
    }
}

// ============================================================================
// Category
// ============================================================================

/// Functional category assigned by the pattern categorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FrameworkStep,
    FrameworkOrchestrator,
    Database,
    Validation,
    Analytics,
    Deployment,
    Monitoring,
    Configuration,
    Utility,
    WebApi,
    EnterpriseCompliance,
    GeneralPurpose,
}

impl Category {
    pub const ALL: &'static [Category] = &[
        Category::FrameworkStep,
        Category::FrameworkOrchestrator,
        Category::Database,
        Category::Validation,
        Category::Analytics,
        Category::Deployment,
        Category::Monitoring,
        Category::Configuration,
        Category::Utility,
        Category::WebApi,
        Category::EnterpriseCompliance,
        Category::GeneralPurpose,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FrameworkStep => "framework_step",
            Self::FrameworkOrchestrator => "framework_orchestrator",
            Self::Database => "database",
            Self::Validation => "validation",
            Self::Analytics => "analytics",
            Self::Deployment => "deployment",
            Self::Monitoring => "monitoring",
            Self::Configuration => "configuration",
            Self::Utility => "utility",
            Self::WebApi => "web_api",
            Self::EnterpriseCompliance => "enterprise_compliance",
            Self::GeneralPurpose => "general_purpose",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::GeneralPurpose
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let found = Self::ALL.iter().copied().find(|c| c.as_str() == normalized);
        if let Some(category) = found {
            return Ok(category);
        }

        // Legacy names used by older catalogs.
        match normalized.as_str() {
            "database_operations" | "db" => Ok(Self::Database),
            "validation_testing" => Ok(Self::Validation),
            "analysis_reporting" => Ok(Self::Analytics),
            "deployment_setup" => Ok(Self::Deployment),
            "utility_scripts" => Ok(Self::Utility),
            "general" => Ok(Self::GeneralPurpose),
            _ => Err(DomainError::UnknownCategory(s.to_string())),
        }
    }
}

// ============================================================================
// Variable Type
// ============================================================================

/// Declared type of a template variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Path,
    Version,
    Environment,
    #[default]
    String,
}

impl VariableType {
    /// Base name used for variables with no better name available.
    pub const fn base_name(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Version => "version",
            Self::Environment => "environment",
            Self::String => "value",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}
