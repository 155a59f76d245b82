//! Canonical CBOR encoding for deterministic tag input.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 milliseconds, params are a closed enum)
//!
//! The canonical encoding is critical: signing and verification share this
//! one encoder, so they can never silently diverge, and the same logical
//! entry always produces identical tag input bytes regardless of how its
//! parameter map was built.

use ciborium::value::Value;

use crate::entry::{AuditEntry, ParamValue};
use crate::types::Tag;

/// Entry field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const SEQ: u64 = 0;
    pub const ACTION: u64 = 1;
    pub const SUBJECT: u64 = 2;
    pub const PARAMS: u64 = 3;
    pub const OUTCOME: u64 = 4;
    pub const REASON: u64 = 5;
    pub const CONTEXT_ID: u64 = 6;
    pub const TIMESTAMP: u64 = 7;
    pub const PREV_TAG: u64 = 8;
}

/// Encode the signed portion of an entry to canonical bytes.
///
/// `prev_tag` is passed explicitly rather than read from the entry: at
/// append time it is the actual tail tag, and during verification it is the
/// *expected* predecessor, so a forged linkage fails the tag check even if
/// the stored `prev_tag` field was rewritten to match.
pub fn signing_bytes(entry: &AuditEntry, prev_tag: &Tag) -> Vec<u8> {
    let value = entry_to_cbor_value(entry, prev_tag);
    let mut buf = Vec::new();
    encode_value_to(&mut buf, &value);
    buf
}

/// Convert the signed entry fields to a CBOR Value (map with integer keys).
fn entry_to_cbor_value(entry: &AuditEntry, prev_tag: &Tag) -> Value {
    // Build map entries in key order (already sorted 0-8)
    let mut entries = Vec::with_capacity(9);

    // 0: seq
    entries.push((Value::Integer(keys::SEQ.into()), Value::Integer(entry.seq.into())));

    // 1: action
    entries.push((
        Value::Integer(keys::ACTION.into()),
        Value::Text(entry.action.clone()),
    ));

    // 2: subject
    entries.push((
        Value::Integer(keys::SUBJECT.into()),
        Value::Text(entry.subject.clone()),
    ));

    // 3: params (map of text key -> param value)
    let params: Vec<(Value, Value)> = entry
        .params
        .iter()
        .map(|(k, v)| (Value::Text(k.clone()), param_to_cbor_value(v)))
        .collect();
    entries.push((Value::Integer(keys::PARAMS.into()), Value::Map(params)));

    // 4: outcome code
    entries.push((
        Value::Integer(keys::OUTCOME.into()),
        Value::Integer(entry.outcome.to_code().into()),
    ));

    // 5: denial reason (null when allowed)
    let reason = match entry.outcome.reason() {
        Some(r) => Value::Text(r.to_string()),
        None => Value::Null,
    };
    entries.push((Value::Integer(keys::REASON.into()), reason));

    // 6: context_id (null or text)
    let context = match &entry.context_id {
        Some(c) => Value::Text(c.clone()),
        None => Value::Null,
    };
    entries.push((Value::Integer(keys::CONTEXT_ID.into()), context));

    // 7: timestamp
    entries.push((
        Value::Integer(keys::TIMESTAMP.into()),
        Value::Integer(entry.timestamp.into()),
    ));

    // 8: prev_tag
    entries.push((
        Value::Integer(keys::PREV_TAG.into()),
        Value::Bytes(prev_tag.0.to_vec()),
    ));

    Value::Map(entries)
}

/// Convert a parameter value to a CBOR Value.
fn param_to_cbor_value(value: &ParamValue) -> Value {
    match value {
        ParamValue::Null => Value::Null,
        ParamValue::Bool(b) => Value::Bool(*b),
        ParamValue::Int(n) => Value::Integer((*n).into()),
        ParamValue::Text(s) => Value::Text(s.clone()),
    }
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            encode_integer(buf, *i);
        }
        Value::Bytes(b) => {
            encode_bytes(buf, b);
        }
        Value::Text(s) => {
            encode_text(buf, s);
        }
        Value::Map(entries) => {
            encode_map_canonical(buf, entries);
        }
        Value::Bool(b) => {
            buf.push(if *b { 0xf5 } else { 0xf4 });
        }
        Value::Null => {
            buf.push(0xf6);
        }
        _ => {
            // The entry model never produces arrays, floats, or tags.
            unreachable!("unsupported CBOR value type in canonical encoding");
        }
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        // Major type 0: unsigned integer
        encode_uint(buf, 0, n as u64);
    } else {
        // Major type 1: negative integer
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    // Encode all keys first to sort by encoded bytes
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    // Sort by encoded key bytes (lexicographic)
    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    // Write map header
    encode_uint(buf, 5, key_value_pairs.len() as u64);

    // Write sorted key-value pairs
    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
