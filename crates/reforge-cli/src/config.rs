//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns the file/env layering; the core crate only ever sees the
//! resolved [`RegenerationConfig`].
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (applied by the command handlers)
//! 2. Environment variables: `REFORGE_<SECTION>__<KEY>`, e.g.
//!    `REFORGE_REGENERATION__ENVIRONMENT=staging`
//! 3. Config file (`--config`, or the platform config dir)
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use reforge_adapters::DiscoveryRules;
use reforge_core::{application::RegenerationConfig, domain::EnvironmentContext};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "REFORGE";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub discovery: DiscoveryConfig,
    pub regeneration: RegenerationConfig,
    pub output: OutputConfig,
    /// Environment contexts loaded into the catalog before each run.
    pub environments: Vec<EnvironmentContext>,
}

/// Where templates, contexts and generation records live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackend {
    /// Process-local; nothing survives the run.
    Memory,
    #[default]
    Sqlite,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub backend: CatalogBackend,
    /// Database file for the sqlite backend; defaults to the platform data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl CatalogConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(AppConfig::default_catalog_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub root: PathBuf,
    #[serde(flatten)]
    pub rules: DiscoveryRules,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            rules: DiscoveryRules::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
}

impl AppConfig {
    /// Load configuration: defaults, then the config file, then `REFORGE_*`
    /// environment variables.
    ///
    /// An explicit `config_file` must exist; the default location is optional.
    pub fn load(config_file: Option<&Path>) -> anyhow::Result<Self> {
        let file = match config_file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(Self::config_path()).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration sources")?;

        let loaded: Self = settings
            .try_deserialize()
            .context("configuration has an invalid shape")?;
        loaded
            .regeneration
            .validate()
            .context("invalid [regeneration] settings")?;
        Ok(loaded)
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.reforge.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "reforge", "reforge")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".reforge.toml"))
    }

    /// Default sqlite catalog location.
    pub fn default_catalog_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "reforge", "reforge")
            .map(|d| d.data_dir().join("catalog.db"))
            .unwrap_or_else(|| PathBuf::from(".reforge").join("catalog.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_use_sqlite_and_current_dir() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.catalog.backend, CatalogBackend::Sqlite);
        assert_eq!(cfg.discovery.root, PathBuf::from("."));
        assert_eq!(cfg.regeneration.environment, "production");
        assert!(cfg.environments.is_empty());
    }

    #[test]
    fn file_layer_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reforge.toml");
        fs::write(
            &path,
            r##"
[catalog]
backend = "memory"

[discovery]
root = "scripts"
max_file_size = 2048

[[discovery.priorities]]
prefix = "core"
priority = 1

[regeneration]
environment = "staging"
max_workers = 2
artifact_timeout_secs = 5.0

[[environments]]
environment_name = "staging"

[environments.variable_bindings]
db_path = "staging.db"

[[environments.transform_rules]]
op = "append"
text = "# staging\n"
"##,
        )
        .unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.catalog.backend, CatalogBackend::Memory);
        assert_eq!(cfg.discovery.root, PathBuf::from("scripts"));
        assert_eq!(cfg.discovery.rules.max_file_size, 2048);
        assert_eq!(cfg.discovery.rules.priority_for(Path::new("core/a.py")), 1);
        assert_eq!(cfg.regeneration.environment, "staging");
        assert_eq!(cfg.regeneration.max_workers, 2);
        assert_eq!(cfg.regeneration.artifact_timeout.as_secs(), 5);

        let staging = &cfg.environments[0];
        assert_eq!(staging.binding("db_path"), Some("staging.db"));
        assert_eq!(staging.transform_rules.len(), 1);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn invalid_regeneration_settings_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reforge.toml");
        fs::write(&path, "[regeneration]\nmax_workers = 0\n").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn default_paths_are_non_empty() {
        assert!(!AppConfig::config_path().as_os_str().is_empty());
        assert!(!AppConfig::default_catalog_path().as_os_str().is_empty());
    }
}
