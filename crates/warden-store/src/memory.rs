//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite but
//! keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use warden_core::{AuditEntry, CapabilityGrant, GrantId};

use crate::error::{Result, StoreError};
use crate::traits::{EntryFilter, GrantStore, LedgerStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Ledger entries keyed by sequence number (kept sorted).
    entries: BTreeMap<u64, AuditEntry>,

    /// Grants keyed by id.
    grants: HashMap<GrantId, CapabilityGrant>,

    /// Issuance order of grants, for stable listing.
    grant_order: Vec<GrantId>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                entries: BTreeMap::new(),
                grants: HashMap::new(),
                grant_order: Vec::new(),
            }),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn append_entry(&self, entry: &AuditEntry) -> Result<()> {
        let mut inner = self.write()?;

        if inner.entries.contains_key(&entry.seq) {
            return Err(StoreError::SequenceExists(entry.seq));
        }

        inner.entries.insert(entry.seq, entry.clone());
        Ok(())
    }

    async fn last_entry(&self) -> Result<Option<AuditEntry>> {
        let inner = self.read()?;
        Ok(inner.entries.values().next_back().cloned())
    }

    async fn entries(&self, filter: &EntryFilter) -> Result<Vec<AuditEntry>> {
        let inner = self.read()?;
        // BTreeMap iterates in ascending key order, so no re-sort is needed.
        Ok(inner
            .entries
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn entry_count(&self) -> Result<u64> {
        let inner = self.read()?;
        Ok(inner.entries.len() as u64)
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn insert_grant(&self, grant: &CapabilityGrant) -> Result<()> {
        let mut inner = self.write()?;
        if inner.grants.insert(grant.id, grant.clone()).is_none() {
            inner.grant_order.push(grant.id);
        }
        Ok(())
    }

    async fn get_grant(&self, id: &GrantId) -> Result<Option<CapabilityGrant>> {
        let inner = self.read()?;
        Ok(inner.grants.get(id).cloned())
    }

    async fn mark_revoked(&self, id: &GrantId) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.grants.get_mut(id) {
            Some(grant) => {
                grant.revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn active_grants(&self) -> Result<Vec<CapabilityGrant>> {
        let inner = self.read()?;
        Ok(inner
            .grant_order
            .iter()
            .filter_map(|id| inner.grants.get(id))
            .filter(|g| !g.revoked)
            .cloned()
            .collect())
    }

    async fn list_grants(&self) -> Result<Vec<CapabilityGrant>> {
        let inner = self.read()?;
        Ok(inner
            .grant_order
            .iter()
            .filter_map(|id| inner.grants.get(id))
            .cloned()
            .collect())
    }
}
