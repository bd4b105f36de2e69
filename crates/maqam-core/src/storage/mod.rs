//! Storage layer
//!
//! SQLite schema and typed storage errors. The `Store` in the crate root
//! builds on these.

pub mod error;
pub mod schema;

pub use error::{StorageError, StorageResult};
