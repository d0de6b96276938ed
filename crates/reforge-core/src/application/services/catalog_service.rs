//! Catalog Service - read-side catalog operations.
//!
//! Handles template queries, record history and environment context
//! loading. Separated from RegenerationService for single responsibility.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    application::{
        ApplicationError,
        ports::{RecordFilter, TemplateCatalog, TemplateQuery},
    },
    domain::{DomainValidator as validator, EnvironmentContext, GenerationRecord, Template, TemplateId},
    error::ReforgeResult,
};

/// Service for catalog operations.
pub struct CatalogService {
    catalog: Arc<dyn TemplateCatalog>,
}

impl CatalogService {
    /// Create a new catalog service.
    pub fn new(catalog: Arc<dyn TemplateCatalog>) -> Self {
        Self { catalog }
    }

    /// Get a template by ID.
    pub fn get(&self, id: &TemplateId) -> ReforgeResult<Template> {
        self.catalog.get(id)
    }

    /// Find templates, best first.
    pub fn list(&self, query: &TemplateQuery) -> ReforgeResult<Vec<Template>> {
        self.catalog.find(query)
    }

    /// Best template matching the query; `NotFound` when none does.
    pub fn best(&self, query: &TemplateQuery) -> ReforgeResult<Template> {
        self.catalog
            .find(query)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ApplicationError::NotFound {
                    what: "template",
                    id: query.name_prefix.clone().unwrap_or_else(|| "*".into()),
                }
                .into()
            })
    }

    /// Validate and store environment contexts, replacing same-named ones.
    #[instrument(skip_all, fields(count = contexts.len()))]
    pub fn load_contexts(&self, contexts: Vec<EnvironmentContext>) -> ReforgeResult<()> {
        for context in contexts {
            validator::validate_environment(&context)?;
            debug!(environment = %context.environment_name, "Loading environment context");
            self.catalog.put_context(context)?;
        }
        Ok(())
    }

    pub fn context(&self, name: &str) -> ReforgeResult<Option<EnvironmentContext>> {
        self.catalog.get_context(name)
    }

    /// Generation history, oldest first.
    pub fn records(&self, filter: &RecordFilter) -> ReforgeResult<Vec<GenerationRecord>> {
        self.catalog.records(filter)
    }
}
