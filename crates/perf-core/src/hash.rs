//! Stable content hashing.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::ErrorInfo;
use crate::serde::to_canonical_json_bytes;

/// Computes a stable SHA256 hash for the provided serializable value.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, ErrorInfo> {
    let bytes = to_canonical_json_bytes(value)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_is_key_order_independent() {
        let a = stable_hash_string(&json!({"model": "m", "batch_size": [1, 2]})).unwrap();
        let b = stable_hash_string(&json!({"batch_size": [1, 2], "model": "m"})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn hash_tracks_array_order() {
        let a = stable_hash_string(&json!([1, 2])).unwrap();
        let b = stable_hash_string(&json!([2, 1])).unwrap();
        assert_ne!(a, b);
    }
}
