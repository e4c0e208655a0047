//! # Message Composition and Verification
//!
//! The sender builds a canonical form of each message, hashes it,
//! signs the hash, and encrypts the plaintext:
//!
//! ```text
//! canonical = {"sender":..,"receiver":..,"msg":..,"ts":..}   (compact JSON)
//! hash      = SHA3-256(canonical)
//! sig       = ECDSA(hash)
//! envelope  = AES-256-GCM(shared_key, plaintext)
//! ```
//!
//! The receiver decrypts, rebuilds the canonical form from what it
//! actually decrypted, and verifies the signature against the
//! *recomputed* hash. The transmitted hash is advisory only: a relay
//! can rewrite it freely without affecting the verdict, because the
//! signature is checked against what the receiver derived itself.
//!
//! Field order in the canonical form is fixed by struct declaration
//! order; serde emits fields in that order, so both directions agree
//! byte-for-byte.

pub mod log;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::encryption::{decrypt, encrypt};
use crate::crypto::hash::{sha3_256, DIGEST_SIZE};
use crate::crypto::keys::KeyPair;
use crate::crypto::signing::{sign_digest, verify_digest, Signature};
use crate::error::{Error, Result};

/// Placeholder shown in place of a message that failed to decrypt.
pub const CORRUPTED_PLACEHOLDER: &str = "[Unable to decrypt message]";

/// The exact structure that gets hashed and signed.
///
/// Field order is load-bearing: it defines the canonical byte sequence.
#[derive(Debug, Serialize)]
struct CanonicalMessage<'a> {
    sender: &'a str,
    receiver: &'a str,
    msg: &'a str,
    ts: &'a str,
}

/// Compact-JSON canonical bytes for a message.
fn canonical_bytes(sender: &str, receiver: &str, msg: &str, ts: &str) -> Vec<u8> {
    // serde_json compact output has no whitespace, matching the
    // canonical form exactly.
    serde_json::to_vec(&CanonicalMessage {
        sender,
        receiver,
        msg,
        ts,
    })
    .unwrap_or_default()
}

/// SHA3-256 of the canonical form, hex-encoded.
pub fn canonical_hash_hex(sender: &str, receiver: &str, msg: &str, ts: &str) -> String {
    hex::encode(sha3_256(&canonical_bytes(sender, receiver, msg, ts)))
}

fn canonical_digest(sender: &str, receiver: &str, msg: &str, ts: &str) -> [u8; DIGEST_SIZE] {
    sha3_256(&canonical_bytes(sender, receiver, msg, ts))
}

/// A message as it travels through the relay.
///
/// The plaintext never appears here; `encrypted_message` is the AES-GCM
/// envelope JSON and `message_hash` covers the canonical form of the
/// plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Username the sender claims (bound into the signed hash)
    pub sender_username: String,
    /// Intended recipient's username
    pub receiver_username: String,
    /// AES-256-GCM envelope JSON
    pub encrypted_message: String,
    /// Hex SHA3-256 of the canonical form, as computed by the sender
    pub message_hash: String,
    /// ECDSA signature over the canonical hash
    pub signature: Signature,
    /// RFC 3339 timestamp with millisecond precision
    pub timestamp: String,
}

/// How an incoming message fared under verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Decrypted and the signature matches the recomputed hash
    Verified,
    /// Decrypted but the signature does not match
    Unverified,
    /// Could not be decrypted at all
    Corrupted,
}

/// A fully processed incoming message, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedMessage {
    /// Locally assigned id, not part of the wire format
    pub id: Uuid,
    /// Sender's username as transmitted
    pub sender: String,
    /// The decrypted plaintext, or [`CORRUPTED_PLACEHOLDER`]
    pub text: String,
    /// Timestamp as transmitted
    pub timestamp: String,
    /// Verification verdict
    pub status: VerificationStatus,
    /// Hash recomputed from the decrypted plaintext; absent when
    /// decryption failed
    pub computed_hash: Option<String>,
    /// Hash as transmitted, kept for diagnostics
    pub transmitted_hash: String,
    /// Whether computed and transmitted hashes agree; advisory only
    pub hash_matches: Option<bool>,
    /// Signature as transmitted
    pub signature: Signature,
    /// Original envelope, kept for diagnostics
    pub encrypted_message: String,
    /// Failure detail when the message could not be decrypted
    pub error_details: Option<String>,
}

/// Validate an RFC 3339 timestamp with an explicit UTC offset.
pub fn validate_timestamp(ts: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(ts)
        .map_err(|e| Error::InvalidInput(format!("Invalid timestamp '{}': {}", ts, e)))
}

/// Compose an outgoing message: canonicalize, hash, sign, encrypt.
pub fn compose_outgoing(
    keypair: &KeyPair,
    my_username: &str,
    their_username: &str,
    their_public_hex: &str,
    plaintext: &str,
    timestamp: DateTime<Utc>,
) -> Result<MessagePayload> {
    if plaintext.is_empty() {
        return Err(Error::InvalidInput("Message must not be empty".into()));
    }

    // Millisecond precision with a literal Z suffix, the same shape
    // every client emits.
    let ts = timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);

    let digest = canonical_digest(my_username, their_username, plaintext, &ts);
    let signature = sign_digest(keypair, &digest)?;
    let encrypted_message = encrypt(keypair, their_public_hex, plaintext)?;

    tracing::debug!(receiver = their_username, ts = %ts, "composed outgoing message");

    Ok(MessagePayload {
        sender_username: my_username.to_string(),
        receiver_username: their_username.to_string(),
        encrypted_message,
        message_hash: hex::encode(digest),
        signature,
        timestamp: ts,
    })
}

/// Process an incoming message: decrypt, recompute, verify.
///
/// Returns `Err` only for inputs rejected before any cryptography runs
/// (a malformed timestamp). Crypto failures are *verdicts*, not errors:
/// an undecryptable envelope yields `Corrupted`, a bad signature yields
/// `Unverified`.
pub fn process_incoming(
    payload: &MessagePayload,
    sender_public_hex: &str,
    keypair: &KeyPair,
    my_username: &str,
) -> Result<ProcessedMessage> {
    validate_timestamp(&payload.timestamp)?;

    let id = Uuid::new_v4();

    let plaintext = match decrypt(keypair, sender_public_hex, &payload.encrypted_message) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                sender = %payload.sender_username,
                error = %e,
                "incoming message failed to decrypt"
            );
            return Ok(ProcessedMessage {
                id,
                sender: payload.sender_username.clone(),
                text: CORRUPTED_PLACEHOLDER.to_string(),
                timestamp: payload.timestamp.clone(),
                status: VerificationStatus::Corrupted,
                computed_hash: None,
                transmitted_hash: payload.message_hash.clone(),
                hash_matches: None,
                signature: payload.signature.clone(),
                encrypted_message: payload.encrypted_message.clone(),
                error_details: Some(e.to_string()),
            });
        }
    };

    let digest = canonical_digest(
        &payload.sender_username,
        my_username,
        &plaintext,
        &payload.timestamp,
    );
    let computed_hash = hex::encode(digest);

    // The verdict rests on the recomputed hash alone. The transmitted
    // hash comparison is recorded but cannot flip the status.
    let signature_ok =
        verify_digest(sender_public_hex, &digest, &payload.signature).unwrap_or(false);
    let hash_matches = computed_hash.eq_ignore_ascii_case(&payload.message_hash);

    let status = if signature_ok {
        VerificationStatus::Verified
    } else {
        VerificationStatus::Unverified
    };

    if status == VerificationStatus::Unverified {
        tracing::warn!(sender = %payload.sender_username, "signature verification failed");
    }

    Ok(ProcessedMessage {
        id,
        sender: payload.sender_username.clone(),
        text: plaintext,
        timestamp: payload.timestamp.clone(),
        status,
        computed_hash: Some(computed_hash),
        transmitted_hash: payload.message_hash.clone(),
        hash_matches: Some(hash_matches),
        signature: payload.signature.clone(),
        encrypted_message: payload.encrypted_message.clone(),
        error_details: None,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::derive_keypair;

    fn alice_and_bob() -> (KeyPair, KeyPair) {
        (
            derive_keypair("alice", "pw-a").unwrap(),
            derive_keypair("bob", "pw-b").unwrap(),
        )
    }

    fn send(alice: &KeyPair, bob: &KeyPair, text: &str) -> MessagePayload {
        compose_outgoing(alice, "alice", "bob", &bob.public_hex(), text, Utc::now()).unwrap()
    }

    #[test]
    fn test_canonical_bytes_shape() {
        let bytes = canonical_bytes("alice", "bob", "hi", "2026-01-01T00:00:00.000Z");
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"sender":"alice","receiver":"bob","msg":"hi","ts":"2026-01-01T00:00:00.000Z"}"#
        );
    }

    #[test]
    fn test_canonical_hash_deterministic() {
        let a = canonical_hash_hex("alice", "bob", "hi", "2026-01-01T00:00:00.000Z");
        let b = canonical_hash_hex("alice", "bob", "hi", "2026-01-01T00:00:00.000Z");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(
            a,
            canonical_hash_hex("alice", "bob", "hi", "2026-01-01T00:00:00.001Z")
        );
    }

    #[test]
    fn test_timestamp_format() {
        let (alice, bob) = alice_and_bob();
        let ts = "2026-03-15T12:30:45.123Z"
            .parse::<DateTime<Utc>>()
            .unwrap();
        let payload =
            compose_outgoing(&alice, "alice", "bob", &bob.public_hex(), "hi", ts).unwrap();
        assert_eq!(payload.timestamp, "2026-03-15T12:30:45.123Z");
    }

    #[test]
    fn test_round_trip_verified() {
        let (alice, bob) = alice_and_bob();
        let payload = send(&alice, &bob, "hello bob");
        let processed = process_incoming(&payload, &alice.public_hex(), &bob, "bob").unwrap();

        assert_eq!(processed.status, VerificationStatus::Verified);
        assert_eq!(processed.text, "hello bob");
        assert_eq!(processed.hash_matches, Some(true));
        assert_eq!(
            processed.computed_hash.as_deref(),
            Some(payload.message_hash.as_str())
        );
    }

    #[test]
    fn test_empty_message_rejected() {
        let (alice, bob) = alice_and_bob();
        let err = compose_outgoing(&alice, "alice", "bob", &bob.public_hex(), "", Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_tampered_hash_still_verified() {
        // The transmitted hash is advisory; corrupting it must not
        // change the verdict.
        let (alice, bob) = alice_and_bob();
        let mut payload = send(&alice, &bob, "hello bob");
        payload.message_hash = "0".repeat(64);

        let processed = process_incoming(&payload, &alice.public_hex(), &bob, "bob").unwrap();
        assert_eq!(processed.status, VerificationStatus::Verified);
        assert_eq!(processed.hash_matches, Some(false));
    }

    #[test]
    fn test_tampered_timestamp_unverified() {
        let (alice, bob) = alice_and_bob();
        let mut payload = send(&alice, &bob, "hello bob");
        payload.timestamp = "2020-01-01T00:00:00.000Z".into();

        let processed = process_incoming(&payload, &alice.public_hex(), &bob, "bob").unwrap();
        assert_eq!(processed.status, VerificationStatus::Unverified);
        assert_eq!(processed.text, "hello bob");
    }

    #[test]
    fn test_tampered_ciphertext_corrupted() {
        let (alice, bob) = alice_and_bob();
        let mut payload = send(&alice, &bob, "hello bob");
        payload.encrypted_message = payload.encrypted_message.replace(
            "\"data\":[",
            "\"data\":[0,",
        );

        let processed = process_incoming(&payload, &alice.public_hex(), &bob, "bob").unwrap();
        assert_eq!(processed.status, VerificationStatus::Corrupted);
        assert_eq!(processed.text, CORRUPTED_PLACEHOLDER);
        assert!(processed.computed_hash.is_none());
        assert!(processed.error_details.is_some());
    }

    #[test]
    fn test_wrong_sender_key_unverified() {
        let (alice, bob) = alice_and_bob();
        let eve = derive_keypair("eve", "pw-e").unwrap();
        let payload = send(&alice, &bob, "hello bob");

        // Bob checks the message against eve's key: decryption fails
        // because the ECDH key differs, so the verdict is Corrupted.
        let processed = process_incoming(&payload, &eve.public_hex(), &bob, "bob").unwrap();
        assert_eq!(processed.status, VerificationStatus::Corrupted);
    }

    #[test]
    fn test_invalid_timestamp_is_error() {
        let (alice, bob) = alice_and_bob();
        let mut payload = send(&alice, &bob, "hello bob");
        payload.timestamp = "2026-03-15 12:30:45".into();

        let err = process_incoming(&payload, &alice.public_hex(), &bob, "bob").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_validate_timestamp_requires_offset() {
        assert!(validate_timestamp("2026-03-15T12:30:45.123Z").is_ok());
        assert!(validate_timestamp("2026-03-15T12:30:45+02:00").is_ok());
        assert!(validate_timestamp("2026-03-15T12:30:45.123").is_err());
        assert!(validate_timestamp("garbage").is_err());
    }

    #[test]
    fn test_wrong_receiver_name_unverified() {
        // The canonical form binds the receiver username; processing
        // under a different local name breaks the signature.
        let (alice, bob) = alice_and_bob();
        let payload = send(&alice, &bob, "hello bob");
        let processed =
            process_incoming(&payload, &alice.public_hex(), &bob, "robert").unwrap();
        assert_eq!(processed.status, VerificationStatus::Unverified);
    }
}
