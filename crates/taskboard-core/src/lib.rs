//! Taskboard Core - Ordered task lists and cross-board moves
//!
//! This crate provides the reconciliation core for a project board:
//!
//! - **Collection**: Dense `0..n` ordering of the tasks in one project (insert, remove, update, reindex, bulk replace)
//! - **Mover**: Moving a task between projects, or within one, as a single logical operation
//! - **Store**: Storage trait with optimistic versioning, plus an in-memory backend
//! - **Persistence**: SQLite-backed store (behind the `sqlite` feature)
//! - **Service**: Request-level operations that load, mutate, and save
//! - **Config**: Storage backend, listen address, and item defaults
//!
//! # Ordering
//!
//! A container's sequence is the source of truth for which tasks it holds.
//! Each task also carries `container_id` and `position`; every operation
//! updates them together so they never disagree with the sequence.
//!
//! ```text
//! Container ──owns──▶ OrderedCollection ──▶ Item { position: 0..n }
//! ```

pub mod collection;
pub mod config;
pub mod container;
pub mod error;
pub mod ids;
pub mod item;
pub mod mover;
pub mod patch;
#[cfg(feature = "sqlite")]
pub mod persistence;
pub mod service;
pub mod store;

pub use collection::OrderedCollection;
pub use config::{BoardConfig, ConfigError, ItemConfig, ServerConfig, StorageBackend, StorageConfig};
pub use container::Container;
pub use error::{BoardError, PersistenceError, Result};
pub use ids::{ContainerId, IdAllocator, ItemId, RandomIds, SequentialIds};
pub use item::{Item, ItemDraft, ItemPatch, NewItem, TagList, DEFAULT_DATE_FORMAT};
pub use mover::{CrossContainerMover, MoveOutcome};
pub use patch::Patch;
#[cfg(feature = "sqlite")]
pub use persistence::SqliteStore;
pub use service::{BoardService, ItemChange};
pub use store::{BoardStore, MemoryStore};

/// Returns the version of taskboard-core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
