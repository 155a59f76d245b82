//! # Warden Core
//!
//! Pure primitives for the Warden audit ledger: entries, keyed tags, and
//! canonicalization.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`AuditEntry`] - One signed, chained record of an authorization decision
//! - [`Tag`] - Keyed BLAKE3 authentication tag linking entries together
//! - [`Signer`] - Computes and verifies tags with a process-wide secret key
//! - [`CapabilityGrant`] - A permission record over a resource scope
//!
//! ## Canonicalization
//!
//! Entries are encoded as deterministic CBOR before signing, so that the
//! same logical entry always produces identical tag input bytes. See the
//! [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod grant;
pub mod types;

pub use canonical::signing_bytes;
pub use crypto::{Signer, SignerKey};
pub use entry::{AuditEntry, EntryRecord, Outcome, ParamValue, Params};
pub use error::CoreError;
pub use grant::{scope_matches, CapabilityGrant};
pub use types::{GrantId, Tag};
