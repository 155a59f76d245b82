//! Error types for Warden core.

use thiserror::Error;

/// Core errors that can occur during entry and key operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("signing key must not be all zeros")]
    WeakKey,

    #[error("invalid signing key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}
