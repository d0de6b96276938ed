//! In-memory template catalog.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use reforge_core::{
    application::{
        ApplicationError,
        ports::{RecordFilter, TemplateCatalog, TemplateQuery},
    },
    domain::{DomainValidator as validator, EnvironmentContext, GenerationRecord, Template, TemplateId},
    error::ReforgeResult,
};

use super::{not_found, unavailable};

#[derive(Default)]
struct State {
    templates: HashMap<TemplateId, Template>,
    contexts: HashMap<String, EnvironmentContext>,
    records: Vec<GenerationRecord>,
    record_ids: HashSet<Uuid>,
}

/// Thread-safe in-memory catalog.
///
/// Clones share the same underlying state.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    inner: Arc<RwLock<State>>,
}

impl InMemoryCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored templates.
    pub fn len(&self) -> ReforgeResult<usize> {
        Ok(self.read()?.templates.len())
    }

    pub fn is_empty(&self) -> ReforgeResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> ReforgeResult<RwLockReadGuard<'_, State>> {
        self.inner
            .read()
            .map_err(|_| unavailable("catalog lock poisoned"))
    }

    fn write(&self) -> ReforgeResult<RwLockWriteGuard<'_, State>> {
        self.inner
            .write()
            .map_err(|_| unavailable("catalog lock poisoned"))
    }
}

impl TemplateCatalog for InMemoryCatalog {
    fn put(&self, template: Template) -> ReforgeResult<TemplateId> {
        validator::validate_template(&template)?;
        let mut state = self.write()?;

        if let Some(existing) = state
            .templates
            .values_mut()
            .find(|t| t.dedup_key() == template.dedup_key())
        {
            existing.updated_at = Utc::now();
            debug!(template = %existing.id, "Template already catalogued");
            return Ok(existing.id);
        }

        let id = template.id;
        state.templates.insert(id, template);
        Ok(id)
    }

    fn get(&self, id: &TemplateId) -> ReforgeResult<Template> {
        self.read()?
            .templates
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    fn find(&self, query: &TemplateQuery) -> ReforgeResult<Vec<Template>> {
        let state = self.read()?;
        let mut found: Vec<_> = state
            .templates
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        found.sort_by(Template::catalog_order);
        Ok(found)
    }

    fn record_usage(&self, id: &TemplateId) -> ReforgeResult<()> {
        let mut state = self.write()?;
        let template = state.templates.get_mut(id).ok_or_else(|| not_found(id))?;
        template.usage_count += 1;
        template.last_used = Some(Utc::now());
        Ok(())
    }

    fn update_effectiveness(&self, id: &TemplateId, score: f64) -> ReforgeResult<()> {
        let mut state = self.write()?;
        let template = state.templates.get_mut(id).ok_or_else(|| not_found(id))?;
        template.effectiveness_score = score.clamp(0.0, 100.0);
        template.updated_at = Utc::now();
        Ok(())
    }

    fn put_context(&self, context: EnvironmentContext) -> ReforgeResult<()> {
        validator::validate_environment(&context)?;
        self.write()?
            .contexts
            .insert(context.environment_name.clone(), context);
        Ok(())
    }

    fn get_context(&self, name: &str) -> ReforgeResult<Option<EnvironmentContext>> {
        Ok(self.read()?.contexts.get(name).cloned())
    }

    fn append_record(&self, record: GenerationRecord) -> ReforgeResult<()> {
        let mut state = self.write()?;
        if !state.record_ids.insert(record.generation_id) {
            return Err(ApplicationError::DuplicateRecord {
                id: record.generation_id.to_string(),
            }
            .into());
        }
        state.records.push(record);
        Ok(())
    }

    fn records(&self, filter: &RecordFilter) -> ReforgeResult<Vec<GenerationRecord>> {
        let state = self.read()?;
        let mut found: Vec<_> = state
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        found.sort_by(GenerationRecord::chronological);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reforge_core::{
        domain::{ArtifactKind, Category, RenderedContent, ValidationOutcome},
        error::ReforgeError,
    };

    fn template(name: &str, content: &str) -> Template {
        Template::builder()
            .name(name)
            .category(Category::Database)
            .kind(ArtifactKind::Script)
            .content(content)
            .build()
            .unwrap()
    }

    fn record(template: &Template, environment: &str) -> GenerationRecord {
        let rendered = RenderedContent {
            template_id: template.id,
            environment_name: environment.into(),
            kind: template.kind,
            content: template.parameterized_content.clone(),
            unresolved: Vec::new(),
        };
        GenerationRecord::new(rendered, "db_sync.py", ValidationOutcome::pass())
    }

    // ========================================================================
    // Put / Get
    // ========================================================================

    #[test]
    fn put_is_idempotent_on_identical_content() {
        let catalog = InMemoryCatalog::new();
        let first = catalog.put(template("db_sync", "x = 1\n")).unwrap();
        let second = catalog.put(template("db_sync", "x = 1\n")).unwrap();

        assert_eq!(first, second);
        assert_eq!(catalog.len().unwrap(), 1);
    }

    #[test]
    fn different_content_is_a_different_template() {
        let catalog = InMemoryCatalog::new();
        let a = catalog.put(template("db_sync", "x = 1\n")).unwrap();
        let b = catalog.put(template("db_sync", "x = 2\n")).unwrap();

        assert_ne!(a, b);
        assert_eq!(catalog.len().unwrap(), 2);
    }

    #[test]
    fn put_rejects_invalid_templates() {
        let catalog = InMemoryCatalog::new();
        let mut t = template("db_sync", "x = 1\n");
        t.parameterized_content = "x = ${undeclared}\n".into();

        let err = catalog.put(t).unwrap_err();
        assert!(matches!(err, ReforgeError::Domain(_)));
        assert!(catalog.is_empty().unwrap());
    }

    #[test]
    fn get_unknown_is_not_found() {
        let err = InMemoryCatalog::new().get(&TemplateId::new()).unwrap_err();
        assert!(matches!(
            err,
            ReforgeError::Application(ApplicationError::NotFound { .. })
        ));
    }

    // ========================================================================
    // Find
    // ========================================================================

    #[test]
    fn find_orders_by_effectiveness_then_usage_then_name() {
        let catalog = InMemoryCatalog::new();
        let low = catalog.put(template("zeta", "a = 1\n")).unwrap();
        let high = catalog.put(template("beta", "b = 1\n")).unwrap();
        let used = catalog.put(template("alpha", "c = 1\n")).unwrap();
        catalog.update_effectiveness(&low, 10.0).unwrap();
        catalog.update_effectiveness(&high, 90.0).unwrap();
        catalog.update_effectiveness(&used, 10.0).unwrap();
        catalog.record_usage(&used).unwrap();

        let names: Vec<_> = catalog
            .find(&TemplateQuery::all())
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["beta", "alpha", "zeta"]);
    }

    #[test]
    fn effectiveness_is_clamped() {
        let catalog = InMemoryCatalog::new();
        let id = catalog.put(template("db_sync", "x = 1\n")).unwrap();
        catalog.update_effectiveness(&id, 250.0).unwrap();
        assert_eq!(catalog.get(&id).unwrap().effectiveness_score, 100.0);
    }

    // ========================================================================
    // Usage
    // ========================================================================

    #[test]
    fn concurrent_usage_increments_are_not_lost() {
        let catalog = InMemoryCatalog::new();
        let id = catalog.put(template("db_sync", "x = 1\n")).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        catalog.record_usage(&id).unwrap();
                    }
                });
            }
        });

        let stored = catalog.get(&id).unwrap();
        assert_eq!(stored.usage_count, 200);
        assert!(stored.last_used.is_some());
    }

    #[test]
    fn poisoned_lock_is_unavailable_everywhere() {
        let catalog = InMemoryCatalog::new();
        let shared = catalog.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.inner.write().unwrap();
            panic!("poison the catalog lock");
        })
        .join();

        let unavailable = |err: ReforgeError| {
            matches!(
                err,
                ReforgeError::Application(ApplicationError::CatalogUnavailable { .. })
            )
        };
        assert!(unavailable(catalog.len().unwrap_err()));
        assert!(unavailable(catalog.is_empty().unwrap_err()));
        assert!(unavailable(
            catalog.put(template("db_sync", "x = 1\n")).unwrap_err()
        ));
    }

    // ========================================================================
    // Contexts and records
    // ========================================================================

    #[test]
    fn contexts_round_trip() {
        let catalog = InMemoryCatalog::new();
        let context = EnvironmentContext::identity("production").with_binding("db_path", "prod.db");
        catalog.put_context(context.clone()).unwrap();

        assert_eq!(catalog.get_context("production").unwrap(), Some(context));
        assert_eq!(catalog.get_context("staging").unwrap(), None);
    }

    #[test]
    fn records_are_append_only() {
        let catalog = InMemoryCatalog::new();
        let t = template("db_sync", "x = 1\n");
        let r = record(&t, "production");

        catalog.append_record(r.clone()).unwrap();
        let err = catalog.append_record(r).unwrap_err();
        assert!(matches!(
            err,
            ReforgeError::Application(ApplicationError::DuplicateRecord { .. })
        ));
    }

    #[test]
    fn records_filter_by_environment() {
        let catalog = InMemoryCatalog::new();
        let t = template("db_sync", "x = 1\n");
        catalog.append_record(record(&t, "production")).unwrap();
        catalog.append_record(record(&t, "staging")).unwrap();

        let filter = RecordFilter {
            template_id: Some(t.id),
            environment: Some("staging".into()),
        };
        let found = catalog.records(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].environment_name, "staging");
    }
}
