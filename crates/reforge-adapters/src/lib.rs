//! Infrastructure adapters for Reforge.
//!
//! This crate implements the ports defined in `reforge_core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod catalog;
pub mod discovery;
pub mod renderer;
pub mod validator;

// Re-export commonly used adapters
pub use catalog::{InMemoryCatalog, SqliteCatalog};
pub use discovery::{DiscoveryRules, FilesystemSource, MemorySource, PriorityRule};
pub use renderer::EnvironmentAdapter;
pub use validator::SyntaxValidator;
