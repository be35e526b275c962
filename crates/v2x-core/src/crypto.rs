// crates/v2x-core/src/crypto.rs

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::V2xError;

/// Compute SHA-256 hash of the given bytes.
///
/// Returns a 32-byte hash.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// SHA-256 of the given bytes as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(hash_bytes(data))
}

/// Serialize a value to JSON with every object's keys sorted lexicographically.
///
/// The output is independent of struct field order and of whether
/// serde_json preserves insertion order, so hashes computed over it are
/// reproducible across implementations.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, V2xError> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&sort_keys(value))?)
}

/// Canonical content hash: SHA-256 over [`canonical_json`], lowercase hex.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String, V2xError> {
    let json = canonical_json(value)?;
    Ok(sha256_hex(json.as_bytes()))
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k, sort_keys(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
