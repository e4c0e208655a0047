//! # Message Encryption
//!
//! AES-256-GCM with a per-conversation key derived via ECDH.
//!
//! ## Key Derivation
//!
//! ```text
//! shared_x = ECDH(my_private, their_public).x        (32 bytes)
//! key      = SHA3-256(ascii_hex_minimal(shared_x))   (32 bytes)
//! ```
//!
//! The digest is taken over the *ASCII minimal-hex* rendering of the
//! x-coordinate, not its raw bytes: leading zero nibbles stripped, then
//! padded back to even length. This matches the big-number hex output
//! conventions of other client implementations, so both sides of a
//! conversation arrive at the same key. ECDH is symmetric, so sender
//! and receiver derive identical keys from their own private halves.
//!
//! ## Envelope Format
//!
//! Ciphertext travels as a JSON string `{"iv":[..],"data":[..]}` where
//! both fields are byte arrays and `data` carries the ciphertext with
//! the 16-byte GCM tag appended. A fresh random 12-byte IV is drawn for
//! every call, so encrypting the same plaintext twice yields different
//! envelopes.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::crypto::hash::{sha3_256, DIGEST_SIZE};
use crate::crypto::keys::{parse_public_hex, KeyPair};
use crate::error::{Error, Result};

/// AES-GCM nonce size in bytes (96 bits)
pub const IV_SIZE: usize = 12;

/// JSON envelope carrying one encrypted message.
#[derive(Debug, Serialize, Deserialize)]
struct EnvelopeWire {
    iv: Vec<u8>,
    data: Vec<u8>,
}

/// Strip leading zero nibbles, then pad to an even number of digits.
/// An all-zero input becomes "00".
fn minimal_even_hex(bytes: &[u8]) -> String {
    let full = hex::encode(bytes);
    let trimmed = full.trim_start_matches('0');
    let minimal = if trimmed.is_empty() { "0" } else { trimmed };
    if minimal.len() % 2 == 1 {
        format!("0{}", minimal)
    } else {
        minimal.to_string()
    }
}

/// Derive the symmetric conversation key shared with a counterparty.
pub fn derive_shared_key(
    keypair: &KeyPair,
    their_public_hex: &str,
) -> Result<[u8; DIGEST_SIZE]> {
    let their_public = parse_public_hex(their_public_hex)?;
    let shared = k256::ecdh::diffie_hellman(
        keypair.secret().to_nonzero_scalar(),
        their_public.as_affine(),
    );
    Ok(sha3_256(
        minimal_even_hex(shared.raw_secret_bytes().as_slice()).as_bytes(),
    ))
}

/// Encrypt a plaintext for a counterparty, returning the JSON envelope.
pub fn encrypt(keypair: &KeyPair, their_public_hex: &str, plaintext: &str) -> Result<String> {
    let key_bytes = derive_shared_key(keypair, their_public_hex)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    let data = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
        .map_err(|_| Error::EncryptionFailed("AES-GCM encryption failed".into()))?;

    let envelope = EnvelopeWire {
        iv: iv.to_vec(),
        data,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decrypt a JSON envelope from a counterparty.
///
/// Distinguishes two failure classes: `InvalidFormat` for envelopes that
/// cannot be parsed at all, `DecryptionFailed` for well-formed envelopes
/// whose tag check or UTF-8 decoding fails (tampering or key mismatch).
pub fn decrypt(keypair: &KeyPair, their_public_hex: &str, envelope_json: &str) -> Result<String> {
    let envelope: EnvelopeWire = serde_json::from_str(envelope_json)
        .map_err(|e| Error::InvalidFormat(format!("Malformed envelope: {}", e)))?;
    if envelope.iv.len() != IV_SIZE {
        return Err(Error::InvalidFormat(format!(
            "IV must be {} bytes, got {}",
            IV_SIZE,
            envelope.iv.len()
        )));
    }

    let key_bytes = derive_shared_key(keypair, their_public_hex)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&envelope.iv), envelope.data.as_ref())
        .map_err(|_| Error::DecryptionFailed("Authentication tag mismatch".into()))?;

    String::from_utf8(plaintext)
        .map_err(|_| Error::DecryptionFailed("Decrypted payload is not valid UTF-8".into()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_even_hex() {
        assert_eq!(minimal_even_hex(&[0x00, 0x0a, 0xbc]), "0abc");
        assert_eq!(minimal_even_hex(&[0xab, 0xcd]), "abcd");
        assert_eq!(minimal_even_hex(&[0x00, 0x00]), "00");
        assert_eq!(minimal_even_hex(&[0x01]), "01");
    }

    #[test]
    fn test_shared_key_symmetric() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let k1 = derive_shared_key(&alice, &bob.public_hex()).unwrap();
        let k2 = derive_shared_key(&bob, &alice.public_hex()).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let envelope = encrypt(&alice, &bob.public_hex(), "hello bob").unwrap();
        let plaintext = decrypt(&bob, &alice.public_hex(), &envelope).unwrap();
        assert_eq!(plaintext, "hello bob");
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let a = encrypt(&alice, &bob.public_hex(), "same text").unwrap();
        let b = encrypt(&alice, &bob.public_hex(), "same text").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let eve = KeyPair::generate();
        let envelope = encrypt(&alice, &bob.public_hex(), "secret").unwrap();
        let err = decrypt(&eve, &alice.public_hex(), &envelope).unwrap_err();
        assert!(matches!(err, Error::DecryptionFailed(_)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let envelope = encrypt(&alice, &bob.public_hex(), "secret").unwrap();
        let mut wire: EnvelopeWire = serde_json::from_str(&envelope).unwrap();
        wire.data[0] ^= 0xff;
        let tampered = serde_json::to_string(&wire).unwrap();
        let err = decrypt(&bob, &alice.public_hex(), &tampered).unwrap_err();
        assert!(matches!(err, Error::DecryptionFailed(_)));
    }

    #[test]
    fn test_malformed_envelope_is_format_error() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let err = decrypt(&bob, &alice.public_hex(), "not json").unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));

        let err = decrypt(&bob, &alice.public_hex(), r#"{"iv":[1,2],"data":[3]}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_unicode_plaintext() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let text = "héllo wörld 日本語 🔐";
        let envelope = encrypt(&alice, &bob.public_hex(), text).unwrap();
        assert_eq!(decrypt(&bob, &alice.public_hex(), &envelope).unwrap(), text);
    }
}
