//! # Identity Derivation
//!
//! Identity keys are not stored server-side or generated at random:
//! they are derived deterministically from the user's credentials, so
//! the same username and password reproduce the same key pair on any
//! device with no key-transport step.
//!
//! ```text
//! seed    = "{username}:{password}"
//! scalar  = SHA3-256(seed)
//! keypair = secp256k1(scalar)
//! ```
//!
//! Any credential change produces an unrelated key pair. The scalar is
//! rejected if it falls outside the valid range (zero or >= curve
//! order), which is astronomically unlikely for real credentials.

use crate::crypto::hash::sha3_256;
use crate::crypto::keys::KeyPair;
use crate::error::{Error, Result};

/// Derive the identity key pair for a set of credentials.
pub fn derive_keypair(username: &str, password: &str) -> Result<KeyPair> {
    if username.is_empty() || password.is_empty() {
        return Err(Error::InvalidInput(
            "Username and password must be non-empty".into(),
        ));
    }
    let seed = format!("{}:{}", username, password);
    let scalar = sha3_256(seed.as_bytes());
    KeyPair::from_secret_bytes(&scalar)
        .map_err(|e| Error::KeyDerivationFailed(format!("Derived scalar unusable: {}", e)))
}

/// Full fingerprint of a public key: SHA3-256 over the ASCII hex of the
/// key, rendered as colon-separated byte pairs
/// (`ab:cd:ef:...`, 32 pairs).
pub fn key_fingerprint(public_key_hex: &str) -> String {
    let digest = sha3_256(public_key_hex.as_bytes());
    digest
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Render a fingerprint for display.
///
/// With `show_full` the colon form is returned untouched. Otherwise the
/// colons are stripped and the hex is abbreviated to the first and last
/// eight characters; strings of sixteen or fewer characters are
/// returned whole.
pub fn format_fingerprint(fingerprint: &str, show_full: bool) -> String {
    if show_full {
        return fingerprint.to_string();
    }
    let clean: String = fingerprint.chars().filter(|c| *c != ':').collect();
    if clean.len() <= 16 {
        return clean;
    }
    format!("{}...{}", &clean[..8], &clean[clean.len() - 8..])
}

// ============================================================================
// TESTS
// ============================================================================
