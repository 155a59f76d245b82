//! Error types for the capability module.

use thiserror::Error;

/// Errors that can occur during capability operations.
#[derive(Debug, Error)]
pub enum CapsError {
    /// Storage error.
    #[error("store error: {0}")]
    Store(#[from] warden_store::StoreError),

    /// A grant failed validation at issuance.
    #[error("invalid grant: {0}")]
    InvalidGrant(String),
}

/// Result type for capability operations.
pub type Result<T> = std::result::Result<T, CapsError>;
