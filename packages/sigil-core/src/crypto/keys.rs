//! # Key Management
//!
//! A single secp256k1 key pair serves both roles in the protocol:
//! ECDSA signing (authenticity) and ECDH key agreement (confidentiality).
//!
//! ## Wire Encodings
//!
//! | Value | Canonical form |
//! |-------|----------------|
//! | Private key | 64 lowercase hex chars (32-byte big-endian scalar) |
//! | Public key | 130 lowercase hex chars (SEC1 uncompressed, `04 || X || Y`) |
//!
//! Parsing is tolerant of shorter private-key hex (left-padded) because
//! big-number libraries in other client implementations emit minimal hex
//! with leading zeros stripped. Public keys are accepted in any valid
//! SEC1 encoding and re-emitted uncompressed.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use rand::rngs::OsRng;

use crate::error::{Error, Result};

/// Size of a private-key scalar in bytes (256 bits)
pub const PRIVATE_KEY_SIZE: usize = 32;

/// A secp256k1 key pair.
///
/// The private scalar is held inside [`k256::SecretKey`], which zeroizes
/// itself on drop. Never transmitted; only the public half leaves the
/// client.
#[derive(Clone)]
pub struct KeyPair {
    secret: SecretKey,
}

impl KeyPair {
    /// Generate a random key pair.
    ///
    /// Identity keys are normally *derived* from credentials instead
    /// (see [`crate::identity::derive_keypair`]); random generation is
    /// for ephemeral use and tests.
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    /// Create a key pair from a raw 32-byte scalar.
    ///
    /// Fails with `InvalidKey` if the scalar is zero or not below the
    /// curve order.
    pub fn from_secret_bytes(bytes: &[u8; PRIVATE_KEY_SIZE]) -> Result<Self> {
        let secret = SecretKey::from_slice(bytes)
            .map_err(|_| Error::InvalidKey("Scalar is zero or exceeds the curve order".into()))?;
        Ok(Self { secret })
    }

    /// Parse a key pair from private-key hex (minimal hex tolerated).
    pub fn from_private_hex(hex_str: &str) -> Result<Self> {
        let bytes = decode_scalar_hex(hex_str)?;
        Self::from_secret_bytes(&bytes)
    }

    /// Canonical private-key hex (64 chars, zero-padded).
    ///
    /// Only for local persistence. Never log or transmit this value.
    pub fn private_hex(&self) -> String {
        hex::encode(self.secret.to_bytes())
    }

    /// Canonical public-key hex (SEC1 uncompressed).
    pub fn public_hex(&self) -> String {
        hex::encode(self.secret.public_key().to_encoded_point(false).as_bytes())
    }

    /// The public half of this key pair.
    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    pub(crate) fn secret(&self) -> &SecretKey {
        &self.secret
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Redact the private scalar.
        f.debug_struct("KeyPair")
            .field("public", &self.public_hex())
            .finish_non_exhaustive()
    }
}

/// Parse a counterparty public key from SEC1 hex.
pub fn parse_public_hex(hex_str: &str) -> Result<PublicKey> {
    let bytes = hex::decode(hex_str.trim())
        .map_err(|e| Error::InvalidKey(format!("Invalid public key hex: {}", e)))?;
    PublicKey::from_sec1_bytes(&bytes)
        .map_err(|_| Error::InvalidKey("Not a valid secp256k1 point".into()))
}

/// Decode a 256-bit scalar from hex, left-padding minimal hex.
pub(crate) fn decode_scalar_hex(hex_str: &str) -> Result<[u8; PRIVATE_KEY_SIZE]> {
    let trimmed = hex_str.trim();
    if trimmed.is_empty() || trimmed.len() > PRIVATE_KEY_SIZE * 2 {
        return Err(Error::InvalidKey(format!(
            "Scalar hex must be 1..={} characters, got {}",
            PRIVATE_KEY_SIZE * 2,
            trimmed.len()
        )));
    }

    let padded = if trimmed.len() % 2 == 1 {
        format!("0{}", trimmed)
    } else {
        trimmed.to_string()
    };
    let decoded = hex::decode(&padded)
        .map_err(|e| Error::InvalidKey(format!("Invalid scalar hex: {}", e)))?;

    let mut bytes = [0u8; PRIVATE_KEY_SIZE];
    bytes[PRIVATE_KEY_SIZE - decoded.len()..].copy_from_slice(&decoded);
    Ok(bytes)
}

// ============================================================================
// TESTS
// ============================================================================
