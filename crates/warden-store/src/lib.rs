//! Storage layer for the Warden audit ledger.
//!
//! This crate provides the persistence traits and implementations:
//!
//! - [`LedgerStore`]: append-only persistence for sealed audit entries
//! - [`GrantStore`]: persistence for capability grants
//! - [`SqliteStore`]: the primary backend (rusqlite, bundled SQLite)
//! - [`MemoryStore`]: in-memory backend for tests
//!
//! Stores are deliberately dumb: sequencing, tagging, and authorization
//! decisions all happen above this layer. A store's only integrity duty is
//! to reject duplicate sequence numbers.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{EntryFilter, GrantStore, LedgerStore};
