//! Canonical serialization and hashing.
//!
//! Two hashes are used by the graph:
//!
//! - [`canonical_hash_hex`] over a [`GraphDocument`](crate::GraphDocument)
//!   backs [`ResourceGraph::fingerprint`](crate::ResourceGraph::fingerprint).
//!   The document lists nodes in insertion order with fields in declaration
//!   order, so the same traversal always hashes to the same value whatever
//!   the output style.
//! - [`content_digest`] produces the SHA-256 hex digests that
//!   [`InMemoryProject::hex_digests`](crate::InMemoryProject::hex_digests)
//!   hands to [`ResourceGraph::set_hex_digests`](crate::ResourceGraph::set_hex_digests).

use serde::Serialize;
use sha2::{Digest, Sha256};
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical (compact) JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<u64, serde_json::Error> {
    let bytes = to_canonical_bytes(value)?;
    Ok(xxh64(&bytes, 0))
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(format!("{:016x}", canonical_hash(value)?))
}

/// SHA-256 digest of raw content as a lowercase hex string.
pub fn content_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Entry {
        path: &'static str,
        use_count: u32,
    }

    #[test]
    fn test_hash_is_stable_and_order_sensitive() {
        let a = || Entry { path: "/a.go", use_count: 1 };
        let b = || Entry { path: "/b.go", use_count: 2 };
        let forward = vec![a(), b()];
        let reverse = vec![b(), a()];

        assert_eq!(canonical_hash(&forward).unwrap(), canonical_hash(&forward).unwrap());
        assert_ne!(canonical_hash(&forward).unwrap(), canonical_hash(&reverse).unwrap());
        assert_eq!(canonical_hash_hex(&forward).unwrap().len(), 16);
        assert_eq!(
            to_canonical_bytes(&forward[0]).unwrap(),
            br#"{"path":"/a.go","use_count":1}"#
        );
    }

    #[test]
    fn test_content_digest() {
        assert_eq!(
            content_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
