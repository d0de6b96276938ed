//! Artifact discovery adapters.
//!
//! - [`FilesystemSource`]: walks a directory tree (production)
//! - [`MemorySource`]: a fixed artifact list (testing)

mod filesystem;
mod memory;

pub use filesystem::{DiscoveryRules, FilesystemSource, PriorityRule};
pub use memory::MemorySource;
