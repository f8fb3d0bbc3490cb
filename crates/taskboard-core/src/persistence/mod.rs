//! Persistence layer for boards
//!
//! Provides SQLite-backed storage for containers and their items.

mod schema;
mod sqlite_store;

pub use schema::{Schema, SCHEMA_VERSION};
pub use sqlite_store::SqliteStore;
