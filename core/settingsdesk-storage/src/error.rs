//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Entity not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid data handed to the store.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A store's internal lock was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Lock(&'static str),
}
