pub mod analysis;
pub mod artifact;
pub mod common;
pub mod environment;
pub mod generation;
pub mod template;

pub use crate::domain::DomainError;
pub use analysis::{AnalysisResult, ComplianceReport, ComplianceWeights, Signal, StructuralFacts};
pub use artifact::Artifact;
pub use environment::{EnvironmentContext, RenderedContent, TransformRule, UnresolvedPlaceholder};
pub use generation::{Diagnostic, GenerationRecord, ValidationOutcome};
pub use template::{Template, TemplateBuilder, TemplateId, VariableSchema, VariableSpec};
