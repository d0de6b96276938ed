//! Grammar validation of rendered content.
//!
//! Generated content is parsed, never executed. Leftover placeholders are
//! whatever the renderer reports in [`RenderedContent::unresolved`]; literal
//! `${...}` text in the content is not one.

use reforge_core::{
    application::ports::ContentValidator,
    domain::{
        ArtifactKind, Diagnostic, RenderedContent, ValidationOutcome,
        grammar::{self, SyntaxIssue},
        placeholder,
    },
};
use tracing::{debug, instrument};

/// Validates rendered scripts and configs against their declared grammar.
///
/// Every problem found is reported; validation never stops at the first.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxValidator;

impl SyntaxValidator {
    pub fn new() -> Self {
        Self
    }
}

impl ContentValidator for SyntaxValidator {
    #[instrument(skip_all, fields(kind = %kind, environment = %rendered.environment_name))]
    fn validate(&self, rendered: &RenderedContent, kind: ArtifactKind) -> ValidationOutcome {
        let content = &rendered.content;
        let mut diagnostics = Vec::new();

        if content.trim().is_empty() {
            diagnostics.push(Diagnostic::general("rendered content is empty"));
        }

        diagnostics.extend(
            grammar::check(kind, content)
                .into_iter()
                .map(Diagnostic::from),
        );

        diagnostics.extend(rendered.unresolved.iter().map(|leftover| {
            let message = format!(
                "unresolved placeholder {}",
                placeholder::placeholder(&leftover.name)
            );
            Diagnostic::from(SyntaxIssue::at_offset(content, leftover.offset, message))
        }));

        let outcome = ValidationOutcome::from_diagnostics(diagnostics);
        debug!(
            passed = outcome.passed,
            diagnostics = outcome.diagnostics.len(),
            "Validated"
        );
        outcome
    }
}
