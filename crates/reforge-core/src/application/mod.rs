//! Application layer for Reforge.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (RegenerationService, CatalogService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Config**: The explicit `RegenerationConfig` handed to services
//! - **Report**: Batch summary types
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business logic itself. All business rules live in `crate::domain`.

pub mod config;
pub mod error;
pub mod ports;
pub mod report;
pub mod services;

// Re-export main services
pub use services::{Assessment, CatalogService, RegenerationService};

// Re-export port traits (for adapter implementation)
pub use ports::{
    ArtifactSource, ContentValidator, RecordFilter, TemplateCatalog, TemplateQuery,
    TemplateRenderer,
};

pub use config::RegenerationConfig;
pub use error::ApplicationError;
pub use report::{BatchSummary, FailureEntry, FailureKind, ItemOutcome, ItemReport};
