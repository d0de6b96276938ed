//! Environment adapter: renders a template against an environment context.
//!
//! Strictly ordered:
//! 1. substitute exact placeholders from bindings, then schema defaults
//! 2. apply transform rules in declaration order
//! 3. rescan; leftover placeholders take their default or fail
//!
//! Rules see the text exactly as it will be written: escaped `$${` is
//! already `${` and substituted values are in place. Every byte remembers
//! whether it came from the template or from a rule, and step 3 only looks
//! at `${name}` tokens that start in rule text. Literal `${...}` from the
//! source or from a bound value is never mistaken for a placeholder.

use std::ops::Range;

use reforge_core::{
    application::ports::TemplateRenderer,
    domain::{
        DomainError, EnvironmentContext, RenderedContent, Template, TransformRule,
        placeholder::{self, Segment},
    },
    error::ReforgeResult,
};
use tracing::{debug, instrument};

/// Referentially transparent renderer: identical inputs always produce
/// identical output.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentAdapter;

impl EnvironmentAdapter {
    /// Create a new environment adapter.
    pub fn new() -> Self {
        Self
    }
}

impl TemplateRenderer for EnvironmentAdapter {
    #[instrument(
        skip_all,
        fields(template = %template.name, environment = %context.environment_name)
    )]
    fn adapt(
        &self,
        template: &Template,
        context: &EnvironmentContext,
    ) -> ReforgeResult<RenderedContent> {
        template.check_placeholders_declared()?;

        let substituted = substitute(template, context)?;
        let transformed = context
            .transform_rules
            .iter()
            .fold(substituted, |draft, rule| draft.apply(rule));
        let content = fill_leftovers(template, &transformed)?;
        debug!(rules = context.transform_rules.len(), "Template adapted");

        Ok(RenderedContent {
            template_id: template.id,
            environment_name: context.environment_name.clone(),
            kind: template.kind,
            content,
            unresolved: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Final text; never rescanned.
    Literal,
    /// Written by a transform rule; `${name}` here is a placeholder.
    Rule,
}

/// Text under construction with the origin of every byte.
#[derive(Debug, Default)]
struct Draft {
    text: String,
    origin: Vec<Origin>,
}

impl Draft {
    fn push(&mut self, text: &str, origin: Origin) {
        self.text.push_str(text);
        self.origin.extend(std::iter::repeat_n(origin, text.len()));
    }

    fn copy(&mut self, from: &Draft, range: Range<usize>) {
        self.text.push_str(&from.text[range.clone()]);
        self.origin.extend_from_slice(&from.origin[range]);
    }

    /// Rule text uses template syntax: `${name}` is a placeholder and `$${`
    /// a literal `${`.
    fn push_rule_text(&mut self, text: &str) {
        for segment in placeholder::segments(text) {
            match segment {
                Segment::Literal(text) => self.push(text, Origin::Rule),
                Segment::Escaped => self.push("${", Origin::Literal),
                Segment::Placeholder(name) => {
                    self.push(&placeholder::placeholder(name), Origin::Rule)
                }
            }
        }
    }

    fn apply(self, rule: &TransformRule) -> Draft {
        match rule {
            TransformRule::Replace { from, .. } if from.is_empty() => self,
            TransformRule::Replace { from, to } => {
                let mut out = Draft::default();
                let mut cursor = 0;
                for (start, _) in self.text.match_indices(from.as_str()) {
                    out.copy(&self, cursor..start);
                    out.push_rule_text(to);
                    cursor = start + from.len();
                }
                out.copy(&self, cursor..self.text.len());
                out
            }
            TransformRule::Prepend { text } => {
                let mut out = Draft::default();
                out.push_rule_text(text);
                out.copy(&self, 0..self.text.len());
                out
            }
            TransformRule::Append { text } => {
                let mut out = self;
                out.push_rule_text(text);
                out
            }
        }
    }
}

fn substitute(template: &Template, context: &EnvironmentContext) -> Result<Draft, DomainError> {
    let mut draft = Draft::default();
    for segment in placeholder::segments(&template.parameterized_content) {
        match segment {
            Segment::Literal(text) => draft.push(text, Origin::Literal),
            Segment::Escaped => draft.push("${", Origin::Literal),
            Segment::Placeholder(name) => {
                let value = match context.binding(name) {
                    Some(bound) => bound,
                    None => default_for(template, name)?,
                };
                draft.push(value, Origin::Literal);
            }
        }
    }
    Ok(draft)
}

/// Placeholders can reappear through transform rules.
fn fill_leftovers(template: &Template, draft: &Draft) -> Result<String, DomainError> {
    let text = &draft.text;
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (offset, name) in placeholder::tokens(text) {
        if draft.origin[offset] == Origin::Literal {
            continue;
        }
        let value = template
            .variable_schema
            .get(name)
            .and_then(|spec| spec.default.as_deref())
            .ok_or_else(|| unresolved(name))?;
        out.push_str(&text[cursor..offset]);
        out.push_str(value);
        cursor = offset + name.len() + 3;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

fn default_for<'t>(template: &'t Template, name: &str) -> Result<&'t str, DomainError> {
    let spec = template
        .variable_schema
        .get(name)
        .ok_or_else(|| unresolved(name))?;
    match (&spec.default, spec.required) {
        (Some(default), _) => Ok(default),
        (None, true) => Err(unresolved(name)),
        (None, false) => Ok(""),
    }
}

fn unresolved(name: &str) -> DomainError {
    DomainError::UnresolvedVariable {
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reforge_core::{
        domain::{ArtifactKind, VariableSpec, VariableType},
        error::ReforgeError,
    };

    fn db_template(spec: VariableSpec) -> Template {
        Template::builder()
            .name("db_config")
            .kind(ArtifactKind::Script)
            .content("DB=\"${db_path}\"\n")
            .variable("db_path", spec)
            .build()
            .unwrap()
    }

    fn adapt(template: &Template, context: &EnvironmentContext) -> ReforgeResult<String> {
        EnvironmentAdapter.adapt(template, context).map(|r| r.content)
    }

    fn unresolved_name(err: ReforgeError) -> String {
        match err {
            ReforgeError::Domain(DomainError::UnresolvedVariable { name }) => name,
            other => panic!("expected UnresolvedVariable, got {other:?}"),
        }
    }

    // ========================================================================
    // Substitution
    // ========================================================================

    #[test]
    fn required_without_binding_is_unresolved() {
        let template = db_template(VariableSpec::required(VariableType::Path));
        let err = adapt(&template, &EnvironmentContext::identity("production")).unwrap_err();
        assert_eq!(unresolved_name(err), "db_path");
    }

    #[test]
    fn binding_is_substituted() {
        let template = db_template(VariableSpec::required(VariableType::Path));
        let context = EnvironmentContext::identity("production").with_binding("db_path", "prod.db");
        assert_eq!(adapt(&template, &context).unwrap(), "DB=\"prod.db\"\n");
    }

    #[test]
    fn default_fills_missing_binding() {
        let template = db_template(VariableSpec::optional(VariableType::Path, "dev.db"));
        let context = EnvironmentContext::identity("dev");
        assert_eq!(adapt(&template, &context).unwrap(), "DB=\"dev.db\"\n");
    }

    #[test]
    fn optional_without_default_renders_empty() {
        let template = db_template(VariableSpec {
            var_type: VariableType::Path,
            required: false,
            default: None,
        });
        let context = EnvironmentContext::identity("dev");
        assert_eq!(adapt(&template, &context).unwrap(), "DB=\"\"\n");
    }

    #[test]
    fn only_exact_placeholders_are_replaced() {
        let template = Template::builder()
            .name("paths")
            .kind(ArtifactKind::Script)
            .content("A = \"${db}\"\nB = \"${db_path}\"\nC = \"$db\"\n")
            .variable("db", VariableSpec::required(VariableType::String))
            .variable("db_path", VariableSpec::required(VariableType::Path))
            .build()
            .unwrap();
        let context = EnvironmentContext::identity("prod")
            .with_binding("db", "main")
            .with_binding("db_path", "prod.db");
        assert_eq!(
            adapt(&template, &context).unwrap(),
            "A = \"main\"\nB = \"prod.db\"\nC = \"$db\"\n"
        );
    }

    #[test]
    fn bound_values_are_not_rescanned() {
        let template = db_template(VariableSpec::required(VariableType::Path));
        let context =
            EnvironmentContext::identity("prod").with_binding("db_path", "${HOME}/prod.db");
        assert_eq!(adapt(&template, &context).unwrap(), "DB=\"${HOME}/prod.db\"\n");
    }

    #[test]
    fn escapes_become_literal_placeholders() {
        let template = Template::builder()
            .name("shell")
            .kind(ArtifactKind::Script)
            .content("CMD = \"echo $${HOME}\"\n")
            .build()
            .unwrap();
        let context = EnvironmentContext::identity("prod");
        assert_eq!(adapt(&template, &context).unwrap(), "CMD = \"echo ${HOME}\"\n");
    }

    // ========================================================================
    // Transform rules
    // ========================================================================

    #[test]
    fn rules_apply_in_declaration_order_after_substitution() {
        let template = db_template(VariableSpec::required(VariableType::Path));
        let context = EnvironmentContext::identity("prod")
            .with_binding("db_path", "prod.db")
            .with_rule(TransformRule::Replace {
                from: "prod.db".into(),
                to: "/srv/prod.db".into(),
            })
            .with_rule(TransformRule::Prepend {
                text: "# generated\n".into(),
            })
            .with_rule(TransformRule::Append {
                text: "# end\n".into(),
            });
        assert_eq!(
            adapt(&template, &context).unwrap(),
            "# generated\nDB=\"/srv/prod.db\"\n# end\n"
        );
    }

    #[test]
    fn rules_match_literal_placeholder_text_as_written() {
        let template = Template::builder()
            .name("hint")
            .kind(ArtifactKind::Script)
            .content("HINT = \"set $${HOME} to override\"\n")
            .build()
            .unwrap();
        let context = EnvironmentContext::identity("prod").with_rule(TransformRule::Replace {
            from: "${HOME}".into(),
            to: "/home/app".into(),
        });
        assert_eq!(
            adapt(&template, &context).unwrap(),
            "HINT = \"set /home/app to override\"\n"
        );
    }

    #[test]
    fn rules_can_rewrite_bound_values() {
        let template = db_template(VariableSpec::required(VariableType::Path));
        let context = EnvironmentContext::identity("prod")
            .with_binding("db_path", "${DATA}/prod.db")
            .with_rule(TransformRule::Replace {
                from: "${DATA}".into(),
                to: "/srv".into(),
            });
        assert_eq!(adapt(&template, &context).unwrap(), "DB=\"/srv/prod.db\"\n");
    }

    #[test]
    fn literal_placeholder_text_survives_unrelated_rules() {
        let template = Template::builder()
            .name("hint")
            .kind(ArtifactKind::Script)
            .content("LOG = \"${log_path}\"\nHINT = \"set $${log_path}\"\n")
            .variable("log_path", VariableSpec::optional(VariableType::Path, "logs/app.log"))
            .build()
            .unwrap();
        let context = EnvironmentContext::identity("prod").with_rule(TransformRule::Prepend {
            text: "# generated\n".into(),
        });
        assert_eq!(
            adapt(&template, &context).unwrap(),
            "# generated\nLOG = \"logs/app.log\"\nHINT = \"set ${log_path}\"\n"
        );
    }

    #[test]
    fn escaped_rule_text_stays_literal() {
        let template = db_template(VariableSpec::optional(VariableType::Path, "dev.db"));
        let context = EnvironmentContext::identity("prod").with_rule(TransformRule::Append {
            text: "CMD = \"echo $${mystery}\"\n".into(),
        });
        assert_eq!(
            adapt(&template, &context).unwrap(),
            "DB=\"dev.db\"\nCMD = \"echo ${mystery}\"\n"
        );
    }

    #[test]
    fn empty_replace_matches_nothing() {
        let template = db_template(VariableSpec::optional(VariableType::Path, "dev.db"));
        let context = EnvironmentContext::identity("prod").with_rule(TransformRule::Replace {
            from: String::new(),
            to: "x".into(),
        });
        assert_eq!(adapt(&template, &context).unwrap(), "DB=\"dev.db\"\n");
    }

    #[test]
    fn placeholder_reintroduced_by_rule_takes_its_default() {
        let template = Template::builder()
            .name("log")
            .kind(ArtifactKind::Script)
            .content("LEVEL = \"${level}\"\n")
            .variable("level", VariableSpec::optional(VariableType::String, "INFO"))
            .build()
            .unwrap();
        let context = EnvironmentContext::identity("prod")
            .with_binding("level", "WARN")
            .with_rule(TransformRule::Append {
                text: "FALLBACK = \"${level}\"\n".into(),
            });
        assert_eq!(
            adapt(&template, &context).unwrap(),
            "LEVEL = \"WARN\"\nFALLBACK = \"INFO\"\n"
        );
    }

    #[test]
    fn unknown_placeholder_from_rule_fails() {
        let template = db_template(VariableSpec::required(VariableType::Path));
        let context = EnvironmentContext::identity("prod")
            .with_binding("db_path", "prod.db")
            .with_rule(TransformRule::Append {
                text: "X = \"${mystery}\"\n".into(),
            });
        let err = adapt(&template, &context).unwrap_err();
        assert_eq!(unresolved_name(err), "mystery");
    }

    // ========================================================================
    // Properties
    // ========================================================================

    #[test]
    fn adapting_twice_is_byte_identical() {
        let template = db_template(VariableSpec::optional(VariableType::Path, "dev.db"));
        let context = EnvironmentContext::identity("prod").with_rule(TransformRule::Append {
            text: "\n".into(),
        });
        let first = EnvironmentAdapter.adapt(&template, &context).unwrap();
        let second = EnvironmentAdapter.adapt(&template, &context).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn undeclared_placeholder_is_rejected_before_rendering() {
        let mut template = db_template(VariableSpec::required(VariableType::Path));
        template.variable_schema.clear();
        let context = EnvironmentContext::identity("prod").with_binding("db_path", "prod.db");
        let err = EnvironmentAdapter.adapt(&template, &context).unwrap_err();
        assert!(matches!(
            err,
            ReforgeError::Domain(DomainError::UndeclaredPlaceholder { .. })
        ));
    }
}
