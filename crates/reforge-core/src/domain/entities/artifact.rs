//! Artifact: one unit of source content under analysis.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{
    entities::common::{ContentHash, Priority},
    error::DomainError,
    value_objects::ArtifactKind,
};

/// A script or configuration file handed over by the discovery collaborator.
///
/// The content hash is computed once at construction; everything downstream
/// (analysis memoisation, template de-duplication) keys on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub source_path: PathBuf,
    pub raw_content: String,
    pub content_hash: ContentHash,
    pub kind: ArtifactKind,
    pub size: usize,
    pub line_count: usize,
    pub priority: Priority,
}

impl Artifact {
    /// Build an artifact with an explicit kind.
    pub fn new(
        source_path: impl Into<PathBuf>,
        raw_content: impl Into<String>,
        kind: ArtifactKind,
    ) -> Self {
        let raw_content = raw_content.into();
        Self {
            source_path: source_path.into(),
            content_hash: ContentHash::of(&raw_content),
            size: raw_content.len(),
            line_count: raw_content.lines().count(),
            raw_content,
            kind,
            priority: Priority::default(),
        }
    }

    /// Build an artifact, inferring its kind from the path's extension.
    pub fn from_path(
        source_path: impl Into<PathBuf>,
        raw_content: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let source_path = source_path.into();
        let kind = ArtifactKind::from_path(&source_path).ok_or_else(|| {
            DomainError::UnsupportedArtifact {
                path: source_path.display().to_string(),
                reason: "unrecognised file extension".into(),
            }
        })?;
        Ok(Self::new(source_path, raw_content, kind))
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Priority::new(priority);
        self
    }

    /// File name, used as the artifact's display name and sort key.
    pub fn name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.display().to_string())
    }

    /// File name without extension, used as the template name.
    pub fn stem(&self) -> String {
        self.source_path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name())
    }

    pub fn path(&self) -> &Path {
        &self.source_path
    }

    pub fn display_path(&self) -> String {
        self.source_path.display().to_string()
    }
}
