//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "regenerate a batch" or "list templates".

pub mod catalog_service;
pub mod regeneration_service;

pub use catalog_service::CatalogService;
pub use regeneration_service::{Assessment, RegenerationService};
