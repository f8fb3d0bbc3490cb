//! Error types for taskboard-core

use thiserror::Error;

/// Result type alias for taskboard operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Main error type for board operations
#[derive(Error, Debug)]
pub enum BoardError {
    /// A container or item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A required field is missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The stored container changed since it was loaded
    #[error("Conflict: container {container} is at version {actual}, expected {expected}")]
    Conflict {
        container: String,
        expected: u64,
        actual: u64,
    },

    /// Persistence-related errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl BoardError {
    pub(crate) fn container_not_found(id: impl std::fmt::Display) -> Self {
        BoardError::NotFound(format!("container {}", id))
    }

    pub(crate) fn item_not_found(id: impl std::fmt::Display) -> Self {
        BoardError::NotFound(format!("item {}", id))
    }

    /// Whether this error means the caller should reload and retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, BoardError::Conflict { .. })
    }
}

/// Persistence-specific errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A store lock was poisoned by a panicking writer
    #[error("Store lock poisoned: {0}")]
    LockPoisoned(String),

    /// Stored data could not be decoded into domain types
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    SchemaVersionMismatch { expected: u32, actual: u32 },
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        PersistenceError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for BoardError {
    fn from(err: rusqlite::Error) -> Self {
        BoardError::Persistence(PersistenceError::Database(err.to_string()))
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(err: serde_json::Error) -> Self {
        BoardError::Persistence(PersistenceError::Serialization(err.to_string()))
    }
}

impl<T> From<std::sync::PoisonError<T>> for PersistenceError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        PersistenceError::LockPoisoned(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for BoardError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        BoardError::Persistence(err.into())
    }
}
