//! Template renderers.

mod environment;

pub use environment::EnvironmentAdapter;
