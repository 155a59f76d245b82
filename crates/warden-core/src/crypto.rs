//! Keyed tagging for the audit ledger.
//!
//! Wraps BLAKE3 in keyed mode with strong types. A single process-wide
//! secret key is injected at construction; there is no ambient key state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::types::Tag;

/// A 32-byte secret key for tagging entries.
///
/// The key is loaded once at process start from configuration and is
/// read-only thereafter. Construction rejects degenerate keys so the ledger
/// cannot silently run with a guessable key.
#[derive(Clone, Serialize, Deserialize)]
pub struct SignerKey([u8; 32]);

impl SignerKey {
    /// Create a key from raw bytes.
    ///
    /// Fails on an all-zero key: an absent or defaulted secret must stop
    /// the ledger at startup, not weaken every tag it produces.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CoreError> {
        if bytes == [0u8; 32] {
            return Err(CoreError::WeakKey);
        }
        Ok(Self(bytes))
    }

    /// Parse a key from a hex string (64 hex characters).
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidKey(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| CoreError::InvalidKeyLength(v.len()))?;
        Self::from_bytes(arr)
    }

    /// Generate a random key.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        // A random all-zero key has probability 2^-256; regenerate if the
        // RNG ever produces one rather than propagate an error here.
        while bytes == [0u8; 32] {
            rand::thread_rng().fill_bytes(&mut bytes);
        }
        Self(bytes)
    }

    /// Get the raw key bytes (secret material).
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SignerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        write!(f, "SignerKey(..)")
    }
}

/// Computes and verifies keyed authentication tags over canonical bytes.
///
/// `sign` is deterministic: identical input bytes always yield an identical
/// tag. `verify` compares in constant time via [`blake3::Hash`] equality.
#[derive(Clone)]
pub struct Signer {
    key: SignerKey,
}

impl Signer {
    /// Create a signer with the given key.
    pub fn new(key: SignerKey) -> Self {
        Self { key }
    }

    /// Compute the keyed tag over the given bytes.
    pub fn sign(&self, bytes: &[u8]) -> Tag {
        Tag(*blake3::keyed_hash(self.key.as_bytes(), bytes).as_bytes())
    }

    /// Verify a tag over the given bytes.
    ///
    /// Comparison happens on [`blake3::Hash`], whose equality is
    /// constant-time, so verification does not leak tag prefixes.
    pub fn verify(&self, bytes: &[u8], tag: &Tag) -> bool {
        blake3::keyed_hash(self.key.as_bytes(), bytes) == blake3::Hash::from(tag.0)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signer({:?})", self.key)
    }
}
