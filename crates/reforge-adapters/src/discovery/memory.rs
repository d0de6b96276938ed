//! In-memory artifact source for testing.

use std::sync::{Arc, RwLock};

use reforge_core::{
    application::ports::ArtifactSource, domain::Artifact, error::ReforgeResult,
};

use crate::catalog::unavailable;

/// Artifact source backed by a shared list.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    inner: Arc<RwLock<Vec<Artifact>>>,
}

impl MemorySource {
    pub fn new(artifacts: Vec<Artifact>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(artifacts)),
        }
    }

    /// Add an artifact (testing helper).
    pub fn push(&self, artifact: Artifact) {
        if let Ok(mut inner) = self.inner.write() {
            inner.push(artifact);
        }
    }
}

impl ArtifactSource for MemorySource {
    fn discover(&self) -> ReforgeResult<Vec<Artifact>> {
        self.inner
            .read()
            .map(|a| a.clone())
            .map_err(|_| unavailable("source lock poisoned"))
    }
}
