// crates/flowctl-core/src/hashing.rs
// ============================================================================
// Module: Canonical Hashing
// Description: RFC 8785 JSON canonicalization and SHA-256 content hashing.
// Purpose: Give the graph package install engine a deterministic checksum
// that is stable under key and field reordering.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! A graph package's checksum must be identical whether its JSON keys and
//! array-adjacent fields were written in one order or another. RFC 8785
//! (JCS) canonicalization sorts object keys at every nesting level before
//! hashing, so `{"b":1,"a":2}` and `{"a":2,"b":1}` hash identically.

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

/// Error raised when canonicalizing a value to hashable bytes fails.
#[derive(Debug, Error)]
#[error("failed to canonicalize json: {0}")]
pub struct CanonicalizationError(String);

/// Returns RFC 8785 canonical JSON bytes for a serializable value.
///
/// # Errors
///
/// Returns [`CanonicalizationError`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CanonicalizationError> {
    serde_jcs::to_vec(value).map_err(|err| CanonicalizationError(err.to_string()))
}

/// Computes the lowercase hex SHA-256 digest of a value's canonical JSON
/// representation.
///
/// # Errors
///
/// Returns [`CanonicalizationError`] when serialization fails.
pub fn checksum<T: Serialize + ?Sized>(value: &T) -> Result<String, CanonicalizationError> {
    let bytes = canonical_json_bytes(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}


#[cfg(test)]
mod proptests {
    #![allow(clippy::unwrap_used, reason = "test assertions use panic-based failure reporting")]

    use super::checksum;
    use proptest::prelude::*;
    use serde_json::Map;
    use serde_json::Value;

    fn arbitrary_object(fields: Vec<(String, i64)>) -> Value {
        let mut map = Map::new();
        for (key, value) in fields {
            map.insert(key, Value::from(value));
        }
        Value::Object(map)
    }

    proptest! {
        #[test]
        fn checksum_ignores_field_insertion_order(
            mut fields in prop::collection::vec(("[a-z]{1,6}", any::<i64>()), 1..8)
        ) {
            fields.sort_by(|a, b| a.0.cmp(&b.0));
            fields.dedup_by(|a, b| a.0 == b.0);
            let forward = arbitrary_object(fields.clone());
            let mut reversed = fields;
            reversed.reverse();
            let backward = arbitrary_object(reversed);
            prop_assert_eq!(checksum(&forward).unwrap(), checksum(&backward).unwrap());
        }
    }
}
