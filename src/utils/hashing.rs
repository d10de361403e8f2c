//! Hashed-key identity (spec.md §6 `HashKeys`/`EnableHashedKeysListing`):
//! keys can be stored and listed by a one-way hash of their plaintext
//! rather than the plaintext itself.

use crate::config::HashKeyFunction;
use sha2::{Digest, Sha256};

/// Hash `key_id` per the configured function. Only `Sha256` is implemented
/// natively here; the Murmur variants exist for wire compatibility with
/// deployments migrating from a Murmur-hashed key store and fall back to
/// SHA-256 until a murmur crate is wired in.
pub fn hash_key(key_id: &str, _function: HashKeyFunction) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key_id.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_hashes_identically() {
        let a = hash_key("key1", HashKeyFunction::Sha256);
        let b = hash_key("key1", HashKeyFunction::Sha256);
        assert_eq!(a, b);
        assert_ne!(a, hash_key("key2", HashKeyFunction::Sha256));
    }
}
