//! SHA3-256 helpers.
//!
//! The protocol uses one hash for everything: digesting canonical byte
//! strings for signing, deriving the symmetric key from an ECDH shared
//! secret, and computing public-key fingerprints. Digests travel on the
//! wire as lowercase hex.

use sha3::{Digest, Sha3_256};

/// Size of a SHA3-256 digest in bytes
pub const DIGEST_SIZE: usize = 32;

/// Compute the SHA3-256 digest of a byte string
pub fn sha3_256(data: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the SHA3-256 digest and render it as lowercase hex
pub fn sha3_256_hex(data: &[u8]) -> String {
    hex::encode(sha3_256(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Known-answer vectors from the NIST SHA-3 test suite.

    #[test]
    fn test_empty_input() {
        assert_eq!(
            sha3_256_hex(b""),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn test_abc() {
        assert_eq!(
            sha3_256_hex(b"abc"),
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
        );
    }

    #[test]
    fn test_deterministic() {
        let a = sha3_256(b"sigil");
        let b = sha3_256(b"sigil");
        assert_eq!(a, b);
        assert_ne!(sha3_256(b"sigil"), sha3_256(b"sigi1"));
    }
}
