//! Chain integrity verification.
//!
//! Verification recomputes each entry's tag from its canonical bytes and
//! the tag of its predecessor. A mutated entry, a broken link, or a gap in
//! the sequence all surface as a failure at a specific sequence number.

use tracing::warn;

use warden_core::{signing_bytes, AuditEntry, Signer, Tag};
use warden_store::{EntryFilter, LedgerStore};

use crate::error::Result;

/// Result of a full chain verification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    /// True when every entry verified.
    pub valid: bool,
    /// Number of entries examined.
    pub total: u64,
    /// Number of entries that verified before the first failure.
    pub verified: u64,
    /// Sequence number of the first entry that failed, if any.
    pub first_failure: Option<u64>,
}

impl ChainReport {
    fn intact(total: u64) -> Self {
        Self {
            valid: true,
            total,
            verified: total,
            first_failure: None,
        }
    }
}

/// Recomputes tags to detect out-of-band mutation of the ledger.
///
/// Holds its own [`Signer`] so verification can run against a store opened
/// read-only, independent of any live [`crate::AuditChain`].
pub struct IntegrityVerifier {
    signer: Signer,
}

impl IntegrityVerifier {
    /// Create a verifier with the ledger's signing key.
    pub fn new(signer: Signer) -> Self {
        Self { signer }
    }

    /// Verify a single entry against the tag its predecessor should have.
    ///
    /// The tag is recomputed over `expected_prev`, not the entry's stored
    /// `prev_tag`, so rewriting the stored link cannot forge a valid chain
    /// position.
    pub fn verify_entry(&self, entry: &AuditEntry, expected_prev: &Tag) -> bool {
        if entry.prev_tag != *expected_prev {
            return false;
        }
        let message = signing_bytes(entry, expected_prev);
        self.signer.verify(&message, &entry.tag)
    }

    /// Walk the whole ledger from genesis and verify every entry.
    ///
    /// The walk always runs to the end so `total` reflects the full ledger
    /// even when it breaks early; `verified` counts only the intact prefix.
    pub async fn verify_chain<S: LedgerStore>(&self, store: &S) -> Result<ChainReport> {
        let entries = store.entries(&EntryFilter::all()).await?;
        let total = entries.len() as u64;

        if entries.is_empty() {
            return Ok(ChainReport::intact(0));
        }

        let mut expected_prev = Tag::GENESIS;
        let mut expected_seq = 1u64;
        let mut verified = 0u64;
        let mut first_failure = None;

        for entry in &entries {
            let ok = entry.seq == expected_seq && self.verify_entry(entry, &expected_prev);

            if !ok && first_failure.is_none() {
                warn!(seq = entry.seq, "chain verification failed");
                first_failure = Some(entry.seq);
            }
            if ok && first_failure.is_none() {
                verified += 1;
            }

            // Continue the walk from the stored values so later entries are
            // still examined for the total count.
            expected_prev = entry.tag;
            expected_seq = entry.seq + 1;
        }

        Ok(ChainReport {
            valid: first_failure.is_none(),
            total,
            verified,
            first_failure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use warden_core::{EntryRecord, ParamValue, SignerKey};
    use warden_store::MemoryStore;

    use crate::chain::AuditChain;

    fn signer() -> Signer {
        Signer::new(SignerKey::from_bytes([0x42; 32]).unwrap())
    }

    async fn build_chain(n: u64) -> (Arc<MemoryStore>, Vec<AuditEntry>) {
        let store = Arc::new(MemoryStore::new());
        let chain = AuditChain::new(store.clone(), signer());
        let mut entries = Vec::new();
        for i in 0..n {
            let record = EntryRecord::new("tool_call", format!("tool-{i}"))
                .param("index", i as i64);
            entries.push(chain.append(record).await.unwrap());
        }
        (store, entries)
    }

    /// Rebuild a store from the given entries, applying `mutate` to each.
    async fn store_with(entries: &[AuditEntry], mutate: impl Fn(&mut AuditEntry)) -> MemoryStore {
        let store = MemoryStore::new();
        for entry in entries {
            let mut entry = entry.clone();
            mutate(&mut entry);
            warden_store::LedgerStore::append_entry(&store, &entry)
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_empty_chain_is_valid() {
        let store = MemoryStore::new();
        let report = IntegrityVerifier::new(signer())
            .verify_chain(&store)
            .await
            .unwrap();
        assert_eq!(report, ChainReport::intact(0));
    }

    #[tokio::test]
    async fn test_intact_chain_verifies() {
        let (store, _) = build_chain(5).await;
        let report = IntegrityVerifier::new(signer())
            .verify_chain(store.as_ref())
            .await
            .unwrap();

        assert!(report.valid);
        assert_eq!(report.total, 5);
        assert_eq!(report.verified, 5);
        assert_eq!(report.first_failure, None);
    }

    #[tokio::test]
    async fn test_mutated_entry_detected() {
        let (_, entries) = build_chain(4).await;
        let store = store_with(&entries, |e| {
            if e.seq == 2 {
                e.params.insert("injected".into(), ParamValue::Text("x".into()));
            }
        })
        .await;

        let report = IntegrityVerifier::new(signer())
            .verify_chain(&store)
            .await
            .unwrap();

        assert!(!report.valid);
        assert_eq!(report.total, 4);
        assert_eq!(report.verified, 1);
        assert_eq!(report.first_failure, Some(2));
    }

    #[tokio::test]
    async fn test_flipped_outcome_detected() {
        let (_, entries) = build_chain(3).await;
        let store = store_with(&entries, |e| {
            if e.seq == 3 {
                e.outcome = warden_core::Outcome::Denied {
                    reason: "rewritten".into(),
                };
            }
        })
        .await;

        let report = IntegrityVerifier::new(signer())
            .verify_chain(&store)
            .await
            .unwrap();

        assert_eq!(report.first_failure, Some(3));
        assert_eq!(report.verified, 2);
    }

    #[tokio::test]
    async fn test_rewritten_prev_tag_detected() {
        let (_, entries) = build_chain(3).await;
        let store = store_with(&entries, |e| {
            if e.seq == 2 {
                e.prev_tag = Tag::from_bytes([0xee; 32]);
            }
        })
        .await;

        let report = IntegrityVerifier::new(signer())
            .verify_chain(&store)
            .await
            .unwrap();
        assert_eq!(report.first_failure, Some(2));
    }

    #[tokio::test]
    async fn test_wrong_key_fails_everything() {
        let (store, _) = build_chain(3).await;
        let other = Signer::new(SignerKey::from_bytes([0x43; 32]).unwrap());

        let report = IntegrityVerifier::new(other)
            .verify_chain(store.as_ref())
            .await
            .unwrap();

        assert!(!report.valid);
        assert_eq!(report.verified, 0);
        assert_eq!(report.first_failure, Some(1));
    }

    #[tokio::test]
    async fn test_gap_in_sequence_detected() {
        let (_, entries) = build_chain(4).await;
        // Drop entry 3; entry 4 then follows 2 directly.
        let store = MemoryStore::new();
        for entry in entries.iter().filter(|e| e.seq != 3) {
            warden_store::LedgerStore::append_entry(&store, entry)
                .await
                .unwrap();
        }

        let report = IntegrityVerifier::new(signer())
            .verify_chain(&store)
            .await
            .unwrap();

        assert!(!report.valid);
        assert_eq!(report.total, 3);
        assert_eq!(report.first_failure, Some(4));
    }

    #[tokio::test]
    async fn test_verify_entry_checks_link() {
        let (_, entries) = build_chain(2).await;
        let verifier = IntegrityVerifier::new(signer());

        assert!(verifier.verify_entry(&entries[0], &Tag::GENESIS));
        assert!(verifier.verify_entry(&entries[1], &entries[0].tag));
        assert!(!verifier.verify_entry(&entries[1], &Tag::GENESIS));
    }
}
