//! Filesystem artifact source built on `walkdir`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use walkdir::{DirEntry, WalkDir};

use reforge_core::{
    application::{ApplicationError, ports::ArtifactSource},
    domain::{Artifact, ArtifactKind, Priority},
    error::ReforgeResult,
};

/// Directory names never descended into.
pub const EXCLUDED_DIRS: &[&str] = &["target", "node_modules", "__pycache__", "venv"];

/// Default upper bound on artifact size.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Assigns `priority` to every artifact whose root-relative path starts
/// with `prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRule {
    pub prefix: PathBuf,
    pub priority: u8,
}

impl PriorityRule {
    pub fn new(prefix: impl Into<PathBuf>, priority: u8) -> Self {
        Self {
            prefix: prefix.into(),
            priority,
        }
    }
}

/// Traversal policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryRules {
    /// Checked in order; the first matching prefix wins.
    pub priorities: Vec<PriorityRule>,
    pub default_priority: u8,
    pub max_file_size: u64,
    /// Extra directory names to skip, on top of the built-in list.
    pub exclude_dirs: Vec<String>,
}

impl Default for DiscoveryRules {
    fn default() -> Self {
        Self {
            priorities: Vec::new(),
            default_priority: Priority::DEFAULT.value(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            exclude_dirs: Vec::new(),
        }
    }
}

impl DiscoveryRules {
    pub fn priority_for(&self, relative: &Path) -> u8 {
        self.priorities
            .iter()
            .find(|r| relative.starts_with(&r.prefix))
            .map_or(self.default_priority, |r| r.priority)
    }

    pub fn is_excluded_dir(&self, name: &str) -> bool {
        name.starts_with('.')
            || name.to_ascii_lowercase().contains("backup")
            || EXCLUDED_DIRS.contains(&name)
            || self.exclude_dirs.iter().any(|d| d == name)
    }
}

/// Production artifact source: every script and config file under `root`.
///
/// Artifact paths are relative to `root`, in file-name order.
#[derive(Debug, Clone)]
pub struct FilesystemSource {
    root: PathBuf,
    rules: DiscoveryRules,
}

impl FilesystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_rules(root, DiscoveryRules::default())
    }

    pub fn with_rules(root: impl Into<PathBuf>, rules: DiscoveryRules) -> Self {
        Self {
            root: root.into(),
            rules,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn keep(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        !self
            .rules
            .is_excluded_dir(&entry.file_name().to_string_lossy())
    }

    fn load(&self, path: &Path) -> Option<Artifact> {
        let kind = ArtifactKind::from_path(path)?;
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot stat file, skipping");
                return None;
            }
        };
        if size > self.rules.max_file_size {
            debug!(path = %relative.display(), size, "File too large, skipping");
            return None;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %relative.display(), error = %e, "Cannot read file, skipping");
                return None;
            }
        };

        let priority = self.rules.priority_for(relative);
        Some(Artifact::new(relative, content, kind).with_priority(priority))
    }
}

impl ArtifactSource for FilesystemSource {
    #[instrument(skip_all, fields(root = %self.root.display()))]
    fn discover(&self) -> ReforgeResult<Vec<Artifact>> {
        if !self.root.is_dir() {
            return Err(ApplicationError::DiscoveryFailed {
                path: self.root.clone(),
                reason: "not a directory".into(),
            }
            .into());
        }

        let mut artifacts = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.keep(e));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Directory walk error, skipping entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(artifact) = self.load(entry.path()) {
                artifacts.push(artifact);
            }
        }

        debug!(count = artifacts.len(), "Discovered artifacts");
        Ok(artifacts)
    }
}
