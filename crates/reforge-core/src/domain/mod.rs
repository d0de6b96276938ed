//! Core domain layer for Reforge.
//!
//! Pure analysis and templating logic. All I/O (discovery, storage,
//! rendering backends) is reached through ports defined in the application
//! layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: Parsing works on in-memory content only
//! - **Immutable entities**: All domain objects are Clone + PartialEq
//! - **Rich domain model**: Behavior lives in entities, not services

pub mod categorizer;
pub mod entities;
pub mod error;
pub mod extractor;
pub mod grammar;
pub mod inspector;
pub mod placeholder;
pub mod value_objects;

mod validation;

pub use categorizer::PatternCategorizer;
pub use entities::{
    AnalysisResult, Artifact, ComplianceReport, ComplianceWeights, Diagnostic,
    EnvironmentContext, GenerationRecord, RenderedContent, Signal, StructuralFacts, Template,
    TemplateBuilder, TemplateId, TransformRule, UnresolvedPlaceholder, ValidationOutcome,
    VariableSchema, VariableSpec,
    common::{ContentHash, Priority},
};
pub use error::{DomainError, ErrorCategory};
pub use extractor::{ExtractionPolicy, GateVerdict, SubCheck, TemplateExtractor};
pub use inspector::SourceInspector;
pub use validation::DomainValidator;
pub use value_objects::{ArtifactKind, Category, ConfigFormat, VariableType};
