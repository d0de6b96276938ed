//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `reforge-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `TemplateCatalog`: Template, context and record persistence
//!   - `ArtifactSource`: Artifact discovery
//!   - `TemplateRenderer`: Environment adaptation
//!   - `ContentValidator`: Grammar validation of rendered output
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{
    ArtifactSource, ContentValidator, RecordFilter, TemplateCatalog, TemplateQuery,
    TemplateRenderer,
};

#[cfg(test)]
pub use output::MockTemplateCatalog;
