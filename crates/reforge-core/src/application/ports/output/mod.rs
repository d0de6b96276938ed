//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `reforge-adapters` crate provides implementations.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Artifact, ArtifactKind, Category, EnvironmentContext, GenerationRecord, RenderedContent,
    Template, TemplateId, ValidationOutcome,
};
use crate::error::ReforgeResult;

// ============================================================================
// Query DTOs
// ============================================================================

/// Filter for [`TemplateCatalog::find`]. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateQuery {
    pub category: Option<Category>,
    pub environment: Option<String>,
    pub name_prefix: Option<String>,
}

impl TemplateQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    pub fn matches(&self, template: &Template) -> bool {
        self.category.is_none_or(|c| template.category == c)
            && self
                .environment
                .as_deref()
                .is_none_or(|e| template.matches_environment(e))
            && self
                .name_prefix
                .as_deref()
                .is_none_or(|p| template.name.starts_with(p))
    }
}

/// Filter for [`TemplateCatalog::records`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub template_id: Option<TemplateId>,
    pub environment: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &GenerationRecord) -> bool {
        self.template_id.is_none_or(|id| record.template_id == id)
            && self
                .environment
                .as_deref()
                .is_none_or(|e| record.environment_name == e)
    }
}

// ============================================================================
// Ports
// ============================================================================

/// Port for template persistence.
///
/// Implemented by:
/// - `reforge_adapters::catalog::InMemoryCatalog` (tests, ephemeral runs)
/// - `reforge_adapters::catalog::SqliteCatalog` (persistent)
///
/// ## Contract
///
/// - `put` is idempotent on `Template::dedup_key`; re-putting identical
///   content returns the existing id and only touches `updated_at`.
/// - `record_usage` is atomic; concurrent increments never lose updates.
/// - Generation records are append-only.
/// - Storage failures surface as `ApplicationError::CatalogUnavailable`.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateCatalog: Send + Sync {
    /// Store a template, returning the id it is stored under.
    fn put(&self, template: Template) -> ReforgeResult<TemplateId>;

    /// Fetch a template; fails with `NotFound`.
    fn get(&self, id: &TemplateId) -> ReforgeResult<Template>;

    /// Templates matching the query, in catalog order.
    fn find(&self, query: &TemplateQuery) -> ReforgeResult<Vec<Template>>;

    /// Increment `usage_count` and stamp `last_used`.
    fn record_usage(&self, id: &TemplateId) -> ReforgeResult<()>;

    /// Replace the effectiveness score, clamped to 0..=100.
    fn update_effectiveness(&self, id: &TemplateId, score: f64) -> ReforgeResult<()>;

    /// Store (or replace) an environment context.
    fn put_context(&self, context: EnvironmentContext) -> ReforgeResult<()>;

    fn get_context(&self, name: &str) -> ReforgeResult<Option<EnvironmentContext>>;

    /// Append a generation record; a repeated `generation_id` is rejected.
    fn append_record(&self, record: GenerationRecord) -> ReforgeResult<()>;

    /// Records matching the filter, oldest first.
    fn records(&self, filter: &RecordFilter) -> ReforgeResult<Vec<GenerationRecord>>;
}

/// Port for artifact discovery.
///
/// Traversal policy (which files, which priorities) belongs to the
/// implementation.
pub trait ArtifactSource: Send + Sync {
    fn discover(&self) -> ReforgeResult<Vec<Artifact>>;
}

/// Port for rendering a template against an environment.
///
/// Implementations must be referentially transparent: the same inputs
/// always yield the same output.
pub trait TemplateRenderer: Send + Sync {
    fn adapt(
        &self,
        template: &Template,
        context: &EnvironmentContext,
    ) -> ReforgeResult<RenderedContent>;
}

/// Port for checking rendered content against its grammar.
///
/// Never fails: problems are reported as diagnostics.
pub trait ContentValidator: Send + Sync {
    fn validate(&self, rendered: &RenderedContent, kind: ArtifactKind) -> ValidationOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ValidationOutcome, VariableType, VariableSpec};

    fn template(name: &str, category: Category) -> Template {
        Template::builder()
            .name(name)
            .category(category)
            .kind(ArtifactKind::Script)
            .content("DB = \"${db_path}\"\n")
            .variable("db_path", VariableSpec::required(VariableType::Path))
            .build()
            .unwrap()
    }

    #[test]
    fn empty_query_matches_everything() {
        let t = template("db_sync", Category::Database);
        assert!(TemplateQuery::all().matches(&t));
    }

    #[test]
    fn query_filters_combine() {
        let mut t = template("db_sync", Category::Database);
        t.environments.insert("staging".into());

        assert!(TemplateQuery::all().category(Category::Database).matches(&t));
        assert!(!TemplateQuery::all().category(Category::Utility).matches(&t));
        assert!(TemplateQuery::all().name_prefix("db_").matches(&t));
        assert!(!TemplateQuery::all().name_prefix("sync").matches(&t));
        assert!(TemplateQuery::all().environment("staging").matches(&t));
        assert!(!TemplateQuery::all().environment("production").matches(&t));
    }

    #[test]
    fn record_filter_matches_template_and_environment() {
        let t = template("db_sync", Category::Database);
        let rendered = RenderedContent {
            template_id: t.id,
            environment_name: "production".into(),
            kind: ArtifactKind::Script,
            content: "DB = \"prod.db\"\n".into(),
            unresolved: Vec::new(),
        };
        let record = GenerationRecord::new(rendered, "db_sync.py", ValidationOutcome::pass());

        assert!(RecordFilter::default().matches(&record));
        let by_id = RecordFilter {
            template_id: Some(t.id),
            environment: None,
        };
        assert!(by_id.matches(&record));
        let other_env = RecordFilter {
            template_id: None,
            environment: Some("staging".into()),
        };
        assert!(!other_env.matches(&record));
    }
}
