//! Template catalog implementations.
//!
//! - [`InMemoryCatalog`]: `RwLock` over maps, for tests and throwaway runs
//! - [`SqliteCatalog`]: persistent, single-file SQLite database

mod memory;
mod sqlite;

pub use memory::InMemoryCatalog;
pub use sqlite::SqliteCatalog;

use reforge_core::{application::ApplicationError, error::ReforgeError};

pub(crate) fn unavailable(reason: impl std::fmt::Display) -> ReforgeError {
    ApplicationError::catalog(reason).into()
}

pub(crate) fn not_found(id: impl ToString) -> ReforgeError {
    ApplicationError::NotFound {
        what: "template",
        id: id.to_string(),
    }
    .into()
}
