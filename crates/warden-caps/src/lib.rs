//! Capability management for Warden.
//!
//! A capability is a (permission class, resource scope) pair. This crate
//! issues, revokes, and evaluates capability grants against requests. The
//! matching rules themselves live in `warden-core`; this crate adds the
//! storage-backed lifecycle around them.

pub mod error;
pub mod store;

pub use error::{CapsError, Result};
pub use store::CapabilityStore;
