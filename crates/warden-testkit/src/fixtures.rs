//! Test fixtures for quick scenario setup.

use std::sync::Arc;

use warden::{AuditChain, AuthorizationGate, IntegrityVerifier};
use warden_core::{AuditEntry, EntryRecord, Signer, SignerKey, Tag};
use warden_store::MemoryStore;

/// The fixed test signing key. Deterministic, never used outside tests.
pub const TEST_KEY: [u8; 32] = [0x42; 32];

/// A ready-made in-memory ledger with a deterministic key.
pub struct TestFixture {
    store: Arc<MemoryStore>,
    signer: Signer,
}

impl TestFixture {
    /// Create a fixture with the fixed [`TEST_KEY`].
    pub fn new() -> Self {
        Self::with_key(TEST_KEY)
    }

    /// Create a fixture with a specific key.
    pub fn with_key(key: [u8; 32]) -> Self {
        let key = SignerKey::from_bytes(key).expect("test key must not be all zero");
        Self {
            store: Arc::new(MemoryStore::new()),
            signer: Signer::new(key),
        }
    }

    /// The fixture's store.
    pub fn store(&self) -> Arc<MemoryStore> {
        self.store.clone()
    }

    /// The fixture's signer.
    pub fn signer(&self) -> Signer {
        self.signer.clone()
    }

    /// A chain over the fixture's store.
    pub fn chain(&self) -> AuditChain<MemoryStore> {
        AuditChain::new(self.store.clone(), self.signer.clone())
    }

    /// A gate over the fixture's store.
    pub fn gate(&self) -> AuthorizationGate<MemoryStore> {
        AuthorizationGate::new(self.store.clone(), self.signer.clone())
    }

    /// A verifier holding the fixture's key.
    pub fn verifier(&self) -> IntegrityVerifier {
        IntegrityVerifier::new(self.signer.clone())
    }

    /// Seal a run of records into a correctly linked chain of entries,
    /// without touching any store.
    ///
    /// Useful for building tampered variants: mutate an element of the
    /// returned vector and load it into a fresh store.
    pub fn seal_chain(&self, records: Vec<EntryRecord>) -> Vec<AuditEntry> {
        let mut entries = Vec::with_capacity(records.len());
        let mut prev = Tag::GENESIS;
        for (i, record) in records.into_iter().enumerate() {
            let entry = record.seal(i as u64 + 1, 1_000 + i as i64, prev, &self.signer);
            prev = entry.tag;
            entries.push(entry);
        }
        entries
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
