//! The append-only audit chain.
//!
//! Each appended entry carries the tag of its predecessor and is tagged
//! over that value, so the ledger forms a single linked chain rooted at
//! [`Tag::GENESIS`]. Appends are serialized: seq assignment, prev lookup,
//! sealing, and the durable write happen inside one critical section.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use warden_core::{AuditEntry, EntryRecord, Signer, Tag};
use warden_store::{EntryFilter, LedgerStore};

use crate::error::Result;

/// The tamper-evident audit ledger.
///
/// Generic over storage so tests run against [`warden_store::MemoryStore`]
/// and production against [`warden_store::SqliteStore`].
pub struct AuditChain<S> {
    store: Arc<S>,
    signer: Signer,

    /// Serializes appends. Readers do not take this lock.
    append_lock: Mutex<()>,
}

impl<S: LedgerStore> AuditChain<S> {
    /// Create a chain over the given store, signing with the given key.
    pub fn new(store: Arc<S>, signer: Signer) -> Self {
        Self {
            store,
            signer,
            append_lock: Mutex::new(()),
        }
    }

    /// Seal and append a record, returning the stored entry.
    ///
    /// The ledger assigns the sequence number (1-indexed), the timestamp,
    /// and the predecessor tag. Concurrent callers are serialized; each
    /// append observes the entry committed by the previous one.
    pub async fn append(&self, record: EntryRecord) -> Result<AuditEntry> {
        let _guard = self.append_lock.lock().await;

        let tail = self.store.last_entry().await?;
        let (seq, prev_tag) = match &tail {
            Some(last) => (last.seq + 1, last.tag),
            None => (1, Tag::GENESIS),
        };

        let entry = record.seal(seq, now_millis(), prev_tag, &self.signer);
        self.store.append_entry(&entry).await?;

        debug!(seq, action = %entry.action, outcome = entry.outcome.as_str(), "entry appended");
        Ok(entry)
    }

    /// The most recent entry, or None for an empty ledger.
    pub async fn tail(&self) -> Result<Option<AuditEntry>> {
        Ok(self.store.last_entry().await?)
    }

    /// Entries passing the filter, in ascending sequence order.
    pub async fn entries(&self, filter: &EntryFilter) -> Result<Vec<AuditEntry>> {
        Ok(self.store.entries(filter).await?)
    }

    /// Number of entries in the ledger.
    pub async fn len(&self) -> Result<u64> {
        Ok(self.store.entry_count().await?)
    }

    /// Whether the ledger has no entries.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// The signer used to seal entries.
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::SignerKey;
    use warden_store::MemoryStore;

    fn chain() -> AuditChain<MemoryStore> {
        let signer = Signer::new(SignerKey::from_bytes([0x42; 32]).unwrap());
        AuditChain::new(Arc::new(MemoryStore::new()), signer)
    }

    #[tokio::test]
    async fn test_first_entry_uses_genesis() {
        let chain = chain();
        let entry = chain.append(EntryRecord::new("tool_call", "shell")).await.unwrap();

        assert_eq!(entry.seq, 1);
        assert_eq!(entry.prev_tag, Tag::GENESIS);
        assert!(entry.is_first());
    }

    #[tokio::test]
    async fn test_appends_link_and_number() {
        let chain = chain();
        let e1 = chain.append(EntryRecord::new("tool_call", "a")).await.unwrap();
        let e2 = chain.append(EntryRecord::new("tool_call", "b")).await.unwrap();
        let e3 = chain.append(EntryRecord::new("tool_call", "c")).await.unwrap();

        assert_eq!((e1.seq, e2.seq, e3.seq), (1, 2, 3));
        assert_eq!(e2.prev_tag, e1.tag);
        assert_eq!(e3.prev_tag, e2.tag);

        let tail = chain.tail().await.unwrap().unwrap();
        assert_eq!(tail.seq, 3);
        assert_eq!(chain.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_timestamps_nondecreasing() {
        let chain = chain();
        let e1 = chain.append(EntryRecord::new("a", "x")).await.unwrap();
        let e2 = chain.append(EntryRecord::new("b", "y")).await.unwrap();
        assert!(e2.timestamp >= e1.timestamp);
    }
}
