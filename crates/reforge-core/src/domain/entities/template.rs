//! Template aggregate.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Template (Aggregate Root)                               │
//! │  ├── TemplateId (uuid v4)                                │
//! │  ├── parameterized_content   "DB=\"${db_path}\""         │
//! │  ├── variable_schema         db_path -> VariableSpec     │
//! │  ├── provenance              source_path, tags, deps     │
//! │  └── quality metadata        complexity, effectiveness,  │
//! │                              usage_count, last_used      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! After creation a template is only mutated through its usage and
//! effectiveness counters; the catalog is the one doing that.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::common::ContentHash,
    error::DomainError,
    placeholder,
    value_objects::{ArtifactKind, Category, VariableType},
};

// ============================================================================
// Template Id
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(Uuid);

impl TemplateId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TemplateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TemplateId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| DomainError::InvalidTemplate(format!("bad template id '{s}': {e}")))
    }
}

// ============================================================================
// Variable Schema
// ============================================================================

/// Declaration of one template variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSpec {
    #[serde(rename = "type")]
    pub var_type: VariableType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl VariableSpec {
    /// A required variable with no default; rendering fails without a binding.
    pub fn required(var_type: VariableType) -> Self {
        Self {
            var_type,
            required: true,
            default: None,
        }
    }

    /// An optional variable falling back to `default`.
    pub fn optional(var_type: VariableType, default: impl Into<String>) -> Self {
        Self {
            var_type,
            required: false,
            default: Some(default.into()),
        }
    }
}

pub type VariableSchema = BTreeMap<String, VariableSpec>;

// ============================================================================
// Template
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub category: Category,
    pub kind: ArtifactKind,
    pub parameterized_content: String,
    /// Hash of `parameterized_content`; part of the de-duplication key.
    pub content_hash: ContentHash,
    pub variable_schema: VariableSchema,
    pub pattern_tags: Vec<String>,
    pub dependencies: Vec<String>,
    pub complexity_score: f64,
    pub effectiveness_score: f64,
    pub usage_count: u64,
    /// Compatible environment names. Empty means any.
    pub environments: BTreeSet<String>,
    pub source_path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
}

impl Template {
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    /// Check the structural invariants of the aggregate.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidTemplate("name cannot be empty".into()));
        }

        for name in self.variable_schema.keys() {
            if !placeholder::is_valid_name(name) {
                return Err(DomainError::InvalidTemplate(format!(
                    "'{name}' is not a valid variable name"
                )));
            }
        }

        self.check_placeholders_declared()?;

        if self.content_hash != ContentHash::of(&self.parameterized_content) {
            return Err(DomainError::InvalidTemplate(
                "content hash does not match parameterized content".into(),
            ));
        }

        for (label, score) in [
            ("complexity_score", self.complexity_score),
            ("effectiveness_score", self.effectiveness_score),
        ] {
            if !(0.0..=100.0).contains(&score) {
                return Err(DomainError::InvalidTemplate(format!(
                    "{label} {score} is outside 0..=100"
                )));
            }
        }

        Ok(())
    }

    /// Every placeholder in the content must be declared in the schema.
    pub fn check_placeholders_declared(&self) -> Result<(), DomainError> {
        match placeholder::placeholders(&self.parameterized_content)
            .into_iter()
            .find(|name| !self.variable_schema.contains_key(*name))
        {
            Some(name) => Err(DomainError::UndeclaredPlaceholder {
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn matches_environment(&self, environment: &str) -> bool {
        self.environments.is_empty() || self.environments.contains(environment)
    }

    /// Two templates with the same key are the same template.
    pub fn dedup_key(&self) -> (&str, Category, &ContentHash) {
        (&self.name, self.category, &self.content_hash)
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variable_schema.keys().cloned().collect()
    }

    /// Catalog listing order: effectiveness desc, usage desc, name asc.
    pub fn catalog_order(a: &Template, b: &Template) -> Ordering {
        b.effectiveness_score
            .total_cmp(&a.effectiveness_score)
            .then_with(|| b.usage_count.cmp(&a.usage_count))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    }
}

// ============================================================================
// Builder
// ============================================================================

#[derive(Debug, Default)]
pub struct TemplateBuilder {
    id: Option<TemplateId>,
    name: Option<String>,
    category: Category,
    kind: Option<ArtifactKind>,
    content: Option<String>,
    schema: VariableSchema,
    pattern_tags: Vec<String>,
    dependencies: Vec<String>,
    complexity_score: f64,
    effectiveness_score: f64,
    environments: BTreeSet<String>,
    source_path: PathBuf,
}

impl TemplateBuilder {
    pub fn id(mut self, id: TemplateId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn kind(mut self, kind: ArtifactKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn variable(mut self, name: impl Into<String>, spec: VariableSpec) -> Self {
        self.schema.insert(name.into(), spec);
        self
    }

    pub fn schema(mut self, schema: VariableSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn pattern_tags(mut self, tags: Vec<String>) -> Self {
        self.pattern_tags = tags;
        self
    }

    pub fn dependencies(mut self, deps: Vec<String>) -> Self {
        self.dependencies = deps;
        self
    }

    pub fn complexity_score(mut self, score: f64) -> Self {
        self.complexity_score = score;
        self
    }

    pub fn effectiveness_score(mut self, score: f64) -> Self {
        self.effectiveness_score = score;
        self
    }

    pub fn environment(mut self, name: impl Into<String>) -> Self {
        self.environments.insert(name.into());
        self
    }

    pub fn source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = path.into();
        self
    }

    pub fn build(self) -> Result<Template, DomainError> {
        let name = self
            .name
            .ok_or_else(|| DomainError::InvalidTemplate("name is required".into()))?;
        let kind = self
            .kind
            .ok_or_else(|| DomainError::InvalidTemplate("artifact kind is required".into()))?;
        let content = self
            .content
            .ok_or_else(|| DomainError::InvalidTemplate("content is required".into()))?;

        let now = Utc::now();
        let template = Template {
            id: self.id.unwrap_or_default(),
            name,
            category: self.category,
            kind,
            content_hash: ContentHash::of(&content),
            parameterized_content: content,
            variable_schema: self.schema,
            pattern_tags: self.pattern_tags,
            dependencies: self.dependencies,
            complexity_score: self.complexity_score,
            effectiveness_score: self.effectiveness_score,
            usage_count: 0,
            environments: self.environments,
            source_path: self.source_path,
            created_at: now,
            updated_at: now,
            last_used: None,
        };

        template.validate()?;
        Ok(template)
    }
}
