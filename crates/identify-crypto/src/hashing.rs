//! Hashing and comparison helpers.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash data using BLAKE3
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    blake3::hash(data).into()
}

/// Hash data using SHA-256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Short hex rendering of a public key for logs and `Debug` output
pub fn hex_fingerprint(public_key: &[u8; 32]) -> String {
    hex::encode(&public_key[..8])
}

/// Securely compare two byte slices in constant time
///
/// Lengths are not secret; slices of different length compare unequal immediately.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_hash_deterministic() {
        let data = b"test data";
        assert_eq!(blake3_hash(data), blake3_hash(data));
        assert_ne!(blake3_hash(data), blake3_hash(b"other data"));
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_constant_time_compare() {
        let a = b"secret";
        let b = b"secret";
        let c = b"public";

        assert!(constant_time_compare(a, b));
        assert!(!constant_time_compare(a, c));
        assert!(!constant_time_compare(a, &b[..3]));
    }

    #[test]
    fn test_fingerprint_is_prefix() {
        let key = [0xabu8; 32];
        assert_eq!(hex_fingerprint(&key), "abababababababab");
    }
}
