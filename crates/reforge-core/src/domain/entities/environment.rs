use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{entities::template::TemplateId, error::DomainError, value_objects::ArtifactKind};

/// Ordered text rewrite applied after placeholder substitution.
///
/// `from` is matched against the rendered text as written. Inserted text
/// (`to`, `text`) uses template syntax: `${name}` is a placeholder and `$${`
/// a literal `${`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformRule {
    /// Replace every non-overlapping occurrence of `from` with `to`; an
    /// empty `from` matches nothing.
    Replace { from: String, to: String },
    Prepend { text: String },
    Append { text: String },
}

/// Read-only configuration a template is rendered against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentContext {
    pub environment_name: String,
    #[serde(default)]
    pub variable_bindings: BTreeMap<String, String>,
    #[serde(default)]
    pub transform_rules: Vec<TransformRule>,
}

impl EnvironmentContext {
    /// No bindings and no rules: rendering falls back to schema defaults only.
    pub fn identity(environment_name: impl Into<String>) -> Self {
        Self {
            environment_name: environment_name.into(),
            variable_bindings: BTreeMap::new(),
            transform_rules: Vec::new(),
        }
    }

    pub fn with_binding(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variable_bindings.insert(name.into(), value.into());
        self
    }

    pub fn with_rule(mut self, rule: TransformRule) -> Self {
        self.transform_rules.push(rule);
        self
    }

    pub fn binding(&self, name: &str) -> Option<&str> {
        self.variable_bindings.get(name).map(String::as_str)
    }

    pub fn is_identity(&self) -> bool {
        self.variable_bindings.is_empty() && self.transform_rules.is_empty()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.environment_name.trim().is_empty() {
            return Err(DomainError::InvalidEnvironment(
                "environment name cannot be empty".into(),
            ));
        }
        if let Some(name) = self
            .variable_bindings
            .keys()
            .find(|k| !crate::domain::placeholder::is_valid_name(k))
        {
            return Err(DomainError::InvalidEnvironment(format!(
                "binding '{name}' is not a valid variable name"
            )));
        }
        Ok(())
    }
}

/// Output of the environment adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedContent {
    pub template_id: TemplateId,
    pub environment_name: String,
    pub kind: ArtifactKind,
    pub content: String,
    /// Placeholders the renderer left in `content`. A renderer that fails on
    /// unresolved variables always leaves this empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<UnresolvedPlaceholder>,
}

/// A `${name}` token left in rendered content, by byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedPlaceholder {
    pub name: String,
    pub offset: usize,
}
