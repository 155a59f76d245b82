//! Top-level error type.

use thiserror::Error;

/// Errors surfaced by ledger, gate, and verification operations.
#[derive(Debug, Error)]
pub enum WardenError {
    /// Error from the cryptographic or encoding primitives.
    #[error("core error: {0}")]
    Core(#[from] warden_core::CoreError),

    /// Storage error.
    #[error("store error: {0}")]
    Store(#[from] warden_store::StoreError),

    /// Capability error.
    #[error("capability error: {0}")]
    Caps(#[from] warden_caps::CapsError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, WardenError>;
