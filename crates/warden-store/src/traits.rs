//! Store traits: the abstract interface for ledger and grant persistence.
//!
//! These traits keep the chain and the capability store storage-agnostic.
//! Implementations include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use warden_core::{AuditEntry, CapabilityGrant, GrantId};

use crate::error::Result;

/// Predicate filter for enumerating ledger entries.
///
/// Filtering narrows the result set for operator tooling; it never reorders
/// entries, which always come back in ascending sequence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Only entries with this action.
    pub action: Option<String>,
    /// Only entries with this subject.
    pub subject: Option<String>,
    /// Only entries with `timestamp >= since` (Unix ms).
    pub since: Option<i64>,
    /// Only entries with `timestamp <= until` (Unix ms).
    pub until: Option<i64>,
}

impl EntryFilter {
    /// A filter matching every entry.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to an action category.
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Restrict to a subject.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Restrict to entries at or after the given time (Unix ms).
    pub fn since(mut self, ts: i64) -> Self {
        self.since = Some(ts);
        self
    }

    /// Restrict to entries at or before the given time (Unix ms).
    pub fn until(mut self, ts: i64) -> Self {
        self.until = Some(ts);
        self
    }

    /// Whether an entry passes this filter.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(action) = &self.action {
            if &entry.action != action {
                return false;
            }
        }
        if let Some(subject) = &self.subject {
            if &entry.subject != subject {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.timestamp > until {
                return false;
            }
        }
        true
    }
}

/// Async interface for append-only ledger persistence.
///
/// # Design Notes
///
/// - **Append-only**: there is no update or delete operation. Mutation of
///   persisted rows happens only out-of-band and is caught by verification.
/// - **Duplicate defense**: appending an entry whose sequence number is
///   already present fails with `SequenceExists`; the chain serializes
///   appends above this layer, so a duplicate means that serialization was
///   bypassed.
/// - **Snapshot reads**: readers never observe a partially written entry.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persist a sealed entry durably.
    async fn append_entry(&self, entry: &AuditEntry) -> Result<()>;

    /// Get the most recently appended entry, or None if the ledger is empty.
    async fn last_entry(&self) -> Result<Option<AuditEntry>>;

    /// Enumerate entries passing the filter, ascending by sequence.
    async fn entries(&self, filter: &EntryFilter) -> Result<Vec<AuditEntry>>;

    /// Total number of entries in the ledger.
    async fn entry_count(&self) -> Result<u64>;
}

/// Async interface for capability grant persistence.
///
/// Grants are inserted, flipped to revoked, and listed; never deleted.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Persist a new grant.
    async fn insert_grant(&self, grant: &CapabilityGrant) -> Result<()>;

    /// Get a grant by id.
    async fn get_grant(&self, id: &GrantId) -> Result<Option<CapabilityGrant>>;

    /// Set `revoked = true` on a grant.
    ///
    /// Returns false if the grant does not exist. Revoking an
    /// already-revoked grant succeeds silently and returns true.
    async fn mark_revoked(&self, id: &GrantId) -> Result<bool>;

    /// All grants that have not been revoked.
    async fn active_grants(&self) -> Result<Vec<CapabilityGrant>>;

    /// Every grant ever issued, including revoked ones.
    async fn list_grants(&self) -> Result<Vec<CapabilityGrant>>;
}
