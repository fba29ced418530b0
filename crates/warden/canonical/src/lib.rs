//! Warden Canonical - deterministic serialization and SHA-256 hashing.
//!
//! Every hash in the audit chain is computed over the canonical encoding
//! produced here: object keys sorted lexicographically, arrays in order,
//! one unique string per semantically-equal structure regardless of field
//! insertion order or runtime. The encoding is versioned through a prefix
//! baked into the hash input; changing the encoding or any hashed field
//! subset requires bumping it.

#![deny(unsafe_code)]

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Version prefix mixed into every canonical hash. Bump on any change to
/// the encoding rules or a hashed field subset.
pub const CANONICAL_VERSION: &str = "warden-canonical-v1:";

/// Sentinel `previous_hash` for the first entry of a chain.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Error)]
pub enum CanonicalError {
    #[error("value is not canonically encodable: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CanonicalError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

/// Produce the canonical string encoding of a JSON value.
///
/// Recursive: object keys are sorted before encoding, arrays preserve
/// order, strings are JSON-escaped, numbers use serde_json's display form.
pub fn canonicalize(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_canonical(&mut out, value);
    out
}

fn write_canonical(out: &mut String, value: &serde_json::Value) {
    match value {
        serde_json::Value::Null => out.push_str("null"),
        serde_json::Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        serde_json::Value::Number(n) => out.push_str(&n.to_string()),
        serde_json::Value::String(s) => write_escaped(out, s),
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped(out, key);
                out.push(':');
                if let Some(item) = map.get(key) {
                    write_canonical(out, item);
                }
            }
            out.push('}');
        }
    }
}

fn write_escaped(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// SHA-256 over the versioned canonical encoding of any serializable value,
/// as lowercase hex.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json = serde_json::to_value(value)?;
    let canonical = canonicalize(&json);
    let mut hasher = Sha256::new();
    hasher.update(CANONICAL_VERSION.as_bytes());
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Raw SHA-256 of a byte slice, as lowercase hex. Used for evidence
/// artifacts, where the contract is the file's plain SHA-256.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn object_keys_are_sorted() {
        let value = json!({"zebra": 1, "alpha": {"m": true, "a": null}});
        assert_eq!(
            canonicalize(&value),
            r#"{"alpha":{"a":null,"m":true},"zebra":1}"#
        );
    }

    #[test]
    fn arrays_preserve_order() {
        let value = json!([3, 1, 2]);
        assert_eq!(canonicalize(&value), "[3,1,2]");
    }

    #[test]
    fn strings_are_escaped() {
        let value = json!({"k": "line\nbreak \"quoted\""});
        assert_eq!(canonicalize(&value), r#"{"k":"line\nbreak \"quoted\""}"#);
    }

    #[test]
    fn hash_is_sixty_four_hex_chars() {
        let hash = canonical_hash(&json!({"a": 1})).expect("hashable");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn genesis_sentinel_shape() {
        assert_eq!(GENESIS_HASH.len(), 64);
        assert!(GENESIS_HASH.chars().all(|c| c == '0'));
    }

    #[test]
    fn hash_is_insertion_order_independent() {
        #[derive(Serialize)]
        struct Forward {
            alpha: u32,
            beta: &'static str,
        }
        #[derive(Serialize)]
        struct Backward {
            beta: &'static str,
            alpha: u32,
        }

        let forward = canonical_hash(&Forward {
            alpha: 7,
            beta: "x",
        })
        .expect("hashable");
        let backward = canonical_hash(&Backward {
            beta: "x",
            alpha: 7,
        })
        .expect("hashable");
        assert_eq!(forward, backward);
    }

    #[test]
    fn hash_bytes_matches_known_vector() {
        // SHA-256 of the empty input.
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    fn arb_json(depth: u32) -> impl Strategy<Value = serde_json::Value> {
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::from),
            any::<i64>().prop_map(serde_json::Value::from),
            "[a-zA-Z0-9 _-]{0,12}".prop_map(serde_json::Value::from),
        ];
        leaf.prop_recursive(depth, 24, 6, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4)
                    .prop_map(serde_json::Value::Array),
                proptest::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(|m| {
                    serde_json::Value::Object(m.into_iter().collect())
                }),
            ]
        })
    }

    fn reorder_keys(value: &serde_json::Value) -> serde_json::Value {
        match value {
            serde_json::Value::Object(map) => {
                let mut pairs: Vec<_> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), reorder_keys(v)))
                    .collect();
                pairs.reverse();
                serde_json::Value::Object(pairs.into_iter().collect())
            }
            serde_json::Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(reorder_keys).collect())
            }
            other => other.clone(),
        }
    }

    proptest! {
        #[test]
        fn property_canonicalization_is_key_order_independent(value in arb_json(3)) {
            let reordered = reorder_keys(&value);
            prop_assert_eq!(canonicalize(&value), canonicalize(&reordered));
        }

        #[test]
        fn property_canonicalization_is_idempotent_per_value(value in arb_json(3)) {
            prop_assert_eq!(canonicalize(&value), canonicalize(&value));
        }
    }
}
