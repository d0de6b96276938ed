//! Reforge Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for Reforge: mine
//! reusable, parameterized templates from a tree of Python scripts and
//! configuration files, then regenerate them per target environment.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           reforge-cli (CLI)             │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │ (RegenerationService, CatalogService)   │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Catalog, Source, Renderer, Validator)  │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    reforge-adapters (Infrastructure)    │
//! │ (SqliteCatalog, FilesystemSource, etc)  │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (Inspector, Categorizer, Extractor,     │
//! │  Template, EnvironmentContext)          │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use reforge_core::prelude::*;
//!
//! let service = RegenerationService::new(
//!     catalog,   // Arc<dyn TemplateCatalog>
//!     source,    // Arc<dyn ArtifactSource>
//!     renderer,  // Arc<dyn TemplateRenderer>
//!     validator, // Arc<dyn ContentValidator>
//!     RegenerationConfig::default(),
//! )?;
//! let summary = service.run_batch(Some(3), None).await?;
//! println!("{} of {} regenerated", summary.succeeded, summary.total);
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        ApplicationError, Assessment, BatchSummary, CatalogService, FailureEntry, FailureKind,
        ItemOutcome, ItemReport, RegenerationConfig, RegenerationService,
        ports::{
            ArtifactSource, ContentValidator, RecordFilter, TemplateCatalog, TemplateQuery,
            TemplateRenderer,
        },
    };
    pub use crate::domain::{
        AnalysisResult, Artifact, ArtifactKind, Category, ConfigFormat, DomainError,
        EnvironmentContext, GenerationRecord, Priority, RenderedContent, Template, TemplateId,
        TransformRule, ValidationOutcome, VariableSpec, VariableType,
    };
    pub use crate::error::{ReforgeError, ReforgeResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
