//! Command handlers.
//!
//! Each handler translates arguments into adapter and service calls and
//! renders the result.  Wiring shared between handlers lives here.

use std::sync::Arc;

use tracing::debug;

use reforge_adapters::{InMemoryCatalog, SqliteCatalog};
use reforge_core::application::TemplateCatalog;

use crate::{
    config::{CatalogBackend, CatalogConfig},
    error::CliResult,
};

pub mod analyze;
pub mod completions;
pub mod config;
pub mod run;
pub mod templates;

/// Open the catalog backend named in the configuration.
pub(crate) fn open_catalog(config: &CatalogConfig) -> CliResult<Arc<dyn TemplateCatalog>> {
    match config.backend {
        CatalogBackend::Memory => {
            debug!("Using in-memory catalog");
            Ok(Arc::new(InMemoryCatalog::new()))
        }
        CatalogBackend::Sqlite => {
            let path = config.resolved_path();
            debug!(path = %path.display(), "Opening sqlite catalog");
            Ok(Arc::new(SqliteCatalog::open(&path)?))
        }
    }
}
