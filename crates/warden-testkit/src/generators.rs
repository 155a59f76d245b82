//! Proptest generators for property-based testing.

use proptest::prelude::*;

use warden_core::{
    scope_matches, AuditEntry, EntryRecord, Outcome, ParamValue, Params, Signer, SignerKey, Tag,
};

/// Generate a non-zero signer key.
pub fn signer_key() -> impl Strategy<Value = SignerKey> {
    any::<[u8; 32]>()
        .prop_filter("key must not be all zero", |b| b != &[0u8; 32])
        .prop_map(|b| SignerKey::from_bytes(b).unwrap())
}

/// Generate a random tag.
pub fn tag() -> impl Strategy<Value = Tag> {
    any::<[u8; 32]>().prop_map(Tag::from_bytes)
}

/// Generate an action or subject name.
pub fn name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_/-]{0,31}".prop_map(String::from)
}

/// Generate a parameter value.
pub fn param_value() -> impl Strategy<Value = ParamValue> {
    prop_oneof![
        Just(ParamValue::Null),
        any::<bool>().prop_map(ParamValue::Bool),
        any::<i64>().prop_map(ParamValue::Int),
        ".{0,64}".prop_map(ParamValue::Text),
    ]
}

/// Generate a parameter map.
pub fn params(max_len: usize) -> impl Strategy<Value = Params> {
    prop::collection::btree_map("[a-z][a-z0-9_]{0,15}", param_value(), 0..=max_len)
}

/// Generate an outcome.
pub fn outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::Allowed),
        ".{0,64}".prop_map(|reason| Outcome::Denied { reason }),
    ]
}

/// Generate a valid sequence number (1-indexed).
pub fn seq() -> impl Strategy<Value = u64> {
    1u64..=1_000_000u64
}

/// Generate a reasonable timestamp (Unix ms).
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=2_000_000_000_000i64
}

/// Parameters for generating a sealed entry.
#[derive(Debug, Clone)]
pub struct EntrySpec {
    pub key: [u8; 32],
    pub action: String,
    pub subject: String,
    pub params: Params,
    pub outcome: Outcome,
    pub context_id: Option<String>,
    pub seq: u64,
    pub timestamp: i64,
    pub prev_tag: Tag,
}

impl Arbitrary for EntrySpec {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>().prop_filter("key must not be all zero", |b| b != &[0u8; 32]),
            name(),
            name(),
            params(4),
            outcome(),
            prop::option::of("[a-z0-9-]{1,16}".prop_map(String::from)),
            seq(),
            timestamp(),
            tag(),
        )
            .prop_map(
                |(key, action, subject, params, outcome, context_id, seq, ts, prev)| EntrySpec {
                    key,
                    action,
                    subject,
                    params,
                    outcome,
                    context_id,
                    seq,
                    timestamp: ts,
                    prev_tag: prev,
                },
            )
            .boxed()
    }
}

/// Seal an entry from a spec.
pub fn entry_from_spec(spec: &EntrySpec) -> AuditEntry {
    let signer = Signer::new(SignerKey::from_bytes(spec.key).unwrap());
    let mut record = EntryRecord::new(&spec.action, &spec.subject)
        .params(spec.params.clone())
        .outcome(spec.outcome.clone());
    if let Some(context_id) = &spec.context_id {
        record = record.context(context_id.clone());
    }
    record.seal(spec.seq, spec.timestamp, spec.prev_tag, &signer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::signing_bytes;

    proptest! {
        #[test]
        fn test_sealed_tag_deterministic(spec: EntrySpec) {
            let e1 = entry_from_spec(&spec);
            let e2 = entry_from_spec(&spec);
            prop_assert_eq!(e1.tag, e2.tag);
        }

        #[test]
        fn test_sealed_entry_verifies(spec: EntrySpec) {
            let entry = entry_from_spec(&spec);
            let signer = Signer::new(SignerKey::from_bytes(spec.key).unwrap());
            let message = signing_bytes(&entry, &spec.prev_tag);
            prop_assert!(signer.verify(&message, &entry.tag));
        }

        #[test]
        fn test_canonical_bytes_deterministic(spec: EntrySpec) {
            let entry = entry_from_spec(&spec);
            let b1 = signing_bytes(&entry, &spec.prev_tag);
            let b2 = signing_bytes(&entry, &spec.prev_tag);
            prop_assert_eq!(b1, b2);
        }

        #[test]
        fn test_prev_tag_changes_tag(spec: EntrySpec, other in tag()) {
            prop_assume!(other != spec.prev_tag);

            let original = entry_from_spec(&spec);
            let mut moved = spec.clone();
            moved.prev_tag = other;
            let relinked = entry_from_spec(&moved);

            prop_assert_ne!(original.tag, relinked.tag);
        }

        #[test]
        fn test_different_keys_disagree(spec: EntrySpec, other_key in any::<[u8; 32]>()) {
            prop_assume!(other_key != spec.key && other_key != [0u8; 32]);

            let entry = entry_from_spec(&spec);
            let other = Signer::new(SignerKey::from_bytes(other_key).unwrap());
            let message = signing_bytes(&entry, &spec.prev_tag);
            prop_assert!(!other.verify(&message, &entry.tag));
        }

        #[test]
        fn test_scope_matches_itself(scope in name()) {
            prop_assert!(scope_matches(&scope, &scope));
        }

        #[test]
        fn test_global_wildcard_matches_all(scope in name()) {
            prop_assert!(scope_matches("*", &scope));
        }

        #[test]
        fn test_prefix_pattern_covers_extensions(prefix in name(), rest in "[a-z0-9/]{0,16}") {
            let pattern = format!("{prefix}*");
            let requested = format!("{prefix}{rest}");
            prop_assert!(scope_matches(&pattern, &requested));
        }
    }
}
