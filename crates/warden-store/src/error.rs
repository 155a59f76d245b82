//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A ledger entry with this sequence number already exists.
    ///
    /// Appends are serialized above the store; seeing this means a writer
    /// bypassed the append critical section.
    #[error("entry with sequence {0} already exists")]
    SequenceExists(u64),

    /// Entry or grant serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock protecting shared state was poisoned.
    #[error("lock poisoned: {0}")]
    Poisoned(String),

    /// A background blocking task failed to complete.
    #[error("background task failed: {0}")]
    Background(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
