//! # Challenge-Response Authentication
//!
//! Ownership of an identity key is proven without ever sending the
//! password or private key:
//!
//! ```text
//! Client                         Verifier
//!   │  ── request challenge ──►     │  mint nonce, remember it
//!   │  ◄── nonce ──────────────     │
//!   │  sign SHA3-256(nonce)         │
//!   │  ── signature ───────────►    │  consume nonce, verify ECDSA
//!   │  ◄── accept / reject ────     │
//! ```
//!
//! Each principal holds at most one live nonce; requesting a new
//! challenge silently replaces the old one. A nonce is removed the
//! moment a login attempt references it, before the signature check, so
//! it can never be replayed regardless of the verdict. All refusal
//! paths collapse into one `Unauthorized` error to keep the failure
//! reason from leaking.

use std::collections::HashMap;

use parking_lot::Mutex;
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};

use crate::crypto::hash::{sha3_256, DIGEST_SIZE};
use crate::crypto::keys::KeyPair;
use crate::crypto::signing::{sign_digest, verify_digest, Signature};
use crate::error::{Error, Result};

/// Length of a challenge nonce in characters
pub const NONCE_LEN: usize = 24;

/// Generate a random alphanumeric challenge nonce.
pub fn generate_nonce() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// The digest a client must sign to answer a challenge.
pub fn challenge_digest(nonce: &str) -> [u8; DIGEST_SIZE] {
    sha3_256(nonce.as_bytes())
}

/// Answer a challenge with the identity key.
pub fn sign_challenge(keypair: &KeyPair, nonce: &str) -> Result<Signature> {
    sign_digest(keypair, &challenge_digest(nonce))
}

/// Verifier-side state: one pending nonce per principal.
#[derive(Debug, Default)]
pub struct Authenticator {
    nonces: Mutex<HashMap<u64, String>>,
}

impl Authenticator {
    /// Create an authenticator with no pending challenges.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a challenge for a principal, replacing any pending one.
    pub fn challenge(&self, principal: u64) -> String {
        let nonce = generate_nonce();
        self.nonces.lock().insert(principal, nonce.clone());
        nonce
    }

    /// Check a login attempt against the pending challenge.
    ///
    /// The nonce is consumed before anything else happens; a failed
    /// attempt burns it. Every refusal is reported as `Unauthorized`.
    pub fn login(
        &self,
        principal: u64,
        public_key_hex: &str,
        signature: &Signature,
    ) -> Result<()> {
        let nonce = self
            .nonces
            .lock()
            .remove(&principal)
            .ok_or_else(|| Error::Unauthorized("No pending challenge".into()))?;

        let ok = verify_digest(public_key_hex, &challenge_digest(&nonce), signature)
            .map_err(|_| Error::Unauthorized("Challenge verification failed".into()))?;
        if !ok {
            return Err(Error::Unauthorized("Challenge verification failed".into()));
        }
        Ok(())
    }

    /// Number of outstanding challenges, for diagnostics.
    pub fn pending(&self) -> usize {
        self.nonces.lock().len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::derive_keypair;

    #[test]
    fn test_nonce_shape() {
        let nonce = generate_nonce();
        assert_eq!(nonce.len(), NONCE_LEN);
        assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(generate_nonce(), generate_nonce());
    }

    #[test]
    fn test_full_handshake() {
        let kp = derive_keypair("alice", "hunter2").unwrap();
        let auth = Authenticator::new();

        let nonce = auth.challenge(1);
        let sig = sign_challenge(&kp, &nonce).unwrap();
        assert!(auth.login(1, &kp.public_hex(), &sig).is_ok());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let kp = derive_keypair("alice", "hunter2").unwrap();
        let imposter = derive_keypair("alice", "wrong-password").unwrap();
        let auth = Authenticator::new();

        let nonce = auth.challenge(1);
        let sig = sign_challenge(&imposter, &nonce).unwrap();
        let err = auth.login(1, &kp.public_hex(), &sig).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[test]
    fn test_nonce_consumed_even_on_failure() {
        let kp = derive_keypair("alice", "hunter2").unwrap();
        let imposter = derive_keypair("eve", "pw").unwrap();
        let auth = Authenticator::new();

        let nonce = auth.challenge(1);
        let bad_sig = sign_challenge(&imposter, &nonce).unwrap();
        assert!(auth.login(1, &kp.public_hex(), &bad_sig).is_err());

        // A genuine signature over the burned nonce must also fail.
        let good_sig = sign_challenge(&kp, &nonce).unwrap();
        let err = auth.login(1, &kp.public_hex(), &good_sig).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[test]
    fn test_no_replay_after_success() {
        let kp = derive_keypair("alice", "hunter2").unwrap();
        let auth = Authenticator::new();

        let nonce = auth.challenge(1);
        let sig = sign_challenge(&kp, &nonce).unwrap();
        assert!(auth.login(1, &kp.public_hex(), &sig).is_ok());
        assert!(auth.login(1, &kp.public_hex(), &sig).is_err());
    }

    #[test]
    fn test_new_challenge_replaces_old() {
        let kp = derive_keypair("alice", "hunter2").unwrap();
        let auth = Authenticator::new();

        let first = auth.challenge(1);
        let _second = auth.challenge(1);
        assert_eq!(auth.pending(), 1);

        // Signature over the superseded nonce no longer verifies.
        let stale_sig = sign_challenge(&kp, &first).unwrap();
        assert!(auth.login(1, &kp.public_hex(), &stale_sig).is_err());
    }

    #[test]
    fn test_login_without_challenge() {
        let kp = derive_keypair("alice", "hunter2").unwrap();
        let auth = Authenticator::new();
        let sig = sign_challenge(&kp, "never-issued").unwrap();
        let err = auth.login(7, &kp.public_hex(), &sig).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }
}
