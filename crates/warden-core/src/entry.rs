//! AuditEntry: the atomic unit of the tamper-evident ledger.
//!
//! An entry is an immutable, tagged record of one authorization decision.
//! Once appended it is never edited; mutation of persisted entries is
//! detected by verification, not prevented by the API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::canonical::signing_bytes;
use crate::crypto::Signer;
use crate::types::Tag;

/// Ordered parameter map of an audited action.
///
/// `BTreeMap` keeps keys sorted, so the serialized form is independent of
/// insertion order.
pub type Params = BTreeMap<String, ParamValue>;

/// A parameter value recorded with an audit entry.
///
/// This is a closed set: no floats, so canonical encoding never has to
/// normalize numeric formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Absent or null argument.
    Null,
    /// Boolean argument.
    Bool(bool),
    /// Integer argument.
    Int(i64),
    /// Text argument.
    Text(String),
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// The outcome of an authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The caller held a matching unrevoked capability.
    Allowed,
    /// The action was refused.
    Denied {
        /// Non-leaky explanation recorded with the entry.
        reason: String,
    },
}

impl Outcome {
    /// Wire code for canonical encoding and storage.
    pub fn to_code(&self) -> u8 {
        match self {
            Self::Allowed => 0,
            Self::Denied { .. } => 1,
        }
    }

    /// Reconstruct from a wire code plus optional reason.
    pub fn from_code(code: u8, reason: Option<String>) -> Option<Self> {
        match code {
            0 => Some(Self::Allowed),
            1 => Some(Self::Denied {
                reason: reason.unwrap_or_default(),
            }),
            _ => None,
        }
    }

    /// Short outcome label ("allowed" / "denied").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Denied { .. } => "denied",
        }
    }

    /// Whether the action was permitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// The denial reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed => None,
            Self::Denied { reason } => Some(reason),
        }
    }
}

/// A complete, sealed audit entry.
///
/// Field order matters only for readability; the canonical encoding fixes
/// the byte layout independently of this declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Sequence number within the ledger (1-indexed, assigned at append).
    pub seq: u64,

    /// Operation category (e.g. "tool_call").
    pub action: String,

    /// The specific tool or resource acted upon.
    pub subject: String,

    /// Arguments of the action, key-sorted.
    pub params: Params,

    /// Decision outcome recorded for this action.
    pub outcome: Outcome,

    /// Optional correlation identifier (e.g. a conversation reference).
    pub context_id: Option<String>,

    /// Ledger-assigned creation time (Unix milliseconds).
    pub timestamp: i64,

    /// Tag of the preceding entry, or [`Tag::GENESIS`] for the first.
    pub prev_tag: Tag,

    /// Keyed tag over the canonical encoding of all fields above.
    pub tag: Tag,
}

impl AuditEntry {
    /// Whether this entry claims to be the first in the chain.
    pub fn is_first(&self) -> bool {
        self.prev_tag == Tag::GENESIS
    }
}

/// An unsealed audit record, built by the caller and sealed by the ledger.
///
/// The ledger assigns `seq`, `timestamp`, and `prev_tag` at append time;
/// callers only describe what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Operation category.
    pub action: String,
    /// The specific tool or resource acted upon.
    pub subject: String,
    /// Arguments of the action.
    pub params: Params,
    /// Decision outcome.
    pub outcome: Outcome,
    /// Optional correlation identifier.
    pub context_id: Option<String>,
}

impl EntryRecord {
    /// Start a record for the given action and subject.
    pub fn new(action: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            subject: subject.into(),
            params: Params::new(),
            outcome: Outcome::Allowed,
            context_id: None,
        }
    }

    /// Add a parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Replace the full parameter map.
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Set the outcome.
    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Set the correlation identifier.
    pub fn context(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// Seal the record into a chained, tagged entry.
    ///
    /// The tag covers every field including `prev_tag`, which is what makes
    /// the chain tamper-evident.
    pub fn seal(self, seq: u64, timestamp: i64, prev_tag: Tag, signer: &Signer) -> AuditEntry {
        let mut entry = AuditEntry {
            seq,
            action: self.action,
            subject: self.subject,
            params: self.params,
            outcome: self.outcome,
            context_id: self.context_id,
            timestamp,
            prev_tag,
            tag: Tag::GENESIS, // placeholder until signed below
        };
        let message = signing_bytes(&entry, &prev_tag);
        entry.tag = signer.sign(&message);
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SignerKey;

    fn test_signer() -> Signer {
        Signer::new(SignerKey::from_bytes([0x42; 32]).unwrap())
    }

    #[test]
    fn test_outcome_code_roundtrip() {
        let allowed = Outcome::Allowed;
        let denied = Outcome::Denied {
            reason: "not authorized".into(),
        };

        assert_eq!(
            Outcome::from_code(allowed.to_code(), None).unwrap(),
            allowed
        );
        assert_eq!(
            Outcome::from_code(denied.to_code(), Some("not authorized".into())).unwrap(),
            denied
        );
        assert_eq!(Outcome::from_code(7, None), None);
    }

    #[test]
    fn test_record_builder() {
        let record = EntryRecord::new("tool_call", "shell")
            .param("command", "ls")
            .param("timeout_ms", 5000i64)
            .context("conv-7")
            .outcome(Outcome::Denied {
                reason: "not authorized".into(),
            });

        assert_eq!(record.action, "tool_call");
        assert_eq!(record.subject, "shell");
        assert_eq!(record.params.len(), 2);
        assert_eq!(record.context_id.as_deref(), Some("conv-7"));
        assert!(!record.outcome.is_allowed());
    }

    #[test]
    fn test_seal_produces_verifiable_tag() {
        let signer = test_signer();
        let entry = EntryRecord::new("tool_call", "fs/read")
            .param("path", "/tmp/x")
            .seal(1, 1_736_870_400_000, Tag::GENESIS, &signer);

        assert_eq!(entry.seq, 1);
        assert!(entry.is_first());

        let message = signing_bytes(&entry, &Tag::GENESIS);
        assert!(signer.verify(&message, &entry.tag));
    }

    #[test]
    fn test_seal_deterministic() {
        let signer = test_signer();
        let record = EntryRecord::new("tool_call", "net/http").param("url", "https://example.com");

        let e1 = record.clone().seal(3, 1000, Tag::from_bytes([0xaa; 32]), &signer);
        let e2 = record.seal(3, 1000, Tag::from_bytes([0xaa; 32]), &signer);
        assert_eq!(e1.tag, e2.tag);
    }

    #[test]
    fn test_seal_differs_on_prev_tag() {
        let signer = test_signer();
        let record = EntryRecord::new("tool_call", "net/http");

        let e1 = record.clone().seal(3, 1000, Tag::from_bytes([0xaa; 32]), &signer);
        let e2 = record.seal(3, 1000, Tag::from_bytes([0xbb; 32]), &signer);
        assert_ne!(e1.tag, e2.tag);
    }

    #[test]
    fn test_entry_serde_roundtrip() {
        let signer = test_signer();
        let entry = EntryRecord::new("tool_call", "shell")
            .param("command", "ls")
            .param("dry_run", true)
            .outcome(Outcome::Denied {
                reason: "not authorized".into(),
            })
            .seal(2, 1000, Tag::from_bytes([0x11; 32]), &signer);

        let json = serde_json::to_string(&entry).unwrap();
        let back: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_params_insertion_order_irrelevant() {
        let signer = test_signer();

        let forward = EntryRecord::new("tool_call", "shell")
            .param("a", 1i64)
            .param("b", 2i64)
            .seal(1, 0, Tag::GENESIS, &signer);
        let backward = EntryRecord::new("tool_call", "shell")
            .param("b", 2i64)
            .param("a", 1i64)
            .seal(1, 0, Tag::GENESIS, &signer);

        assert_eq!(forward.tag, backward.tag);
    }
}
