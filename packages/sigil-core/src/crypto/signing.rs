//! # Message Signing
//!
//! ECDSA over secp256k1 on a caller-supplied SHA3-256 digest. Signatures
//! travel as an `{r, s}` pair of hex strings rather than a concatenated
//! blob, so either component may arrive as minimal hex (leading zeros
//! stripped by big-number serializers). Parsing pads components back to
//! 32 bytes; emission is always full-width.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::crypto::hash::DIGEST_SIZE;
use crate::crypto::keys::{decode_scalar_hex, parse_public_hex, KeyPair};
use crate::error::{Error, Result};

/// An ECDSA signature as transmitted on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Hex-encoded r component
    pub r: String,
    /// Hex-encoded s component
    pub s: String,
}

impl Signature {
    fn to_ecdsa(&self) -> Result<EcdsaSignature> {
        let r = decode_scalar_hex(&self.r)?;
        let s = decode_scalar_hex(&self.s)?;
        EcdsaSignature::from_scalars(r, s)
            .map_err(|_| Error::InvalidFormat("Signature components out of range".into()))
    }

    fn from_ecdsa(sig: &EcdsaSignature) -> Self {
        let (r, s) = sig.split_bytes();
        Self {
            r: hex::encode(r),
            s: hex::encode(s),
        }
    }
}

/// Sign a precomputed digest with the key pair's private scalar.
pub fn sign_digest(keypair: &KeyPair, digest: &[u8; DIGEST_SIZE]) -> Result<Signature> {
    let signing_key = SigningKey::from(keypair.secret());
    let sig: EcdsaSignature = signing_key
        .sign_prehash(digest)
        .map_err(|e| Error::SigningFailed(format!("ECDSA signing failed: {}", e)))?;
    Ok(Signature::from_ecdsa(&sig))
}

/// Verify a signature over a precomputed digest.
///
/// Returns `Ok(false)` for a well-formed signature that does not match;
/// errors are reserved for malformed inputs (bad key hex, out-of-range
/// signature components).
pub fn verify_digest(
    public_key_hex: &str,
    digest: &[u8; DIGEST_SIZE],
    signature: &Signature,
) -> Result<bool> {
    let public_key = parse_public_hex(public_key_hex)?;
    let sig = signature.to_ecdsa()?;
    let verifying_key = VerifyingKey::from(&public_key);
    Ok(verifying_key.verify_prehash(digest, &sig).is_ok())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::sha3_256;

    #[test]
    fn test_sign_verify_round_trip() {
        let kp = KeyPair::generate();
        let digest = sha3_256(b"attack at dawn");
        let sig = sign_digest(&kp, &digest).unwrap();
        assert!(verify_digest(&kp.public_hex(), &digest, &sig).unwrap());
    }

    #[test]
    fn test_wrong_digest_fails() {
        let kp = KeyPair::generate();
        let sig = sign_digest(&kp, &sha3_256(b"original")).unwrap();
        assert!(!verify_digest(&kp.public_hex(), &sha3_256(b"tampered"), &sig).unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp = KeyPair::generate();
        let other = KeyPair::generate();
        let digest = sha3_256(b"message");
        let sig = sign_digest(&kp, &digest).unwrap();
        assert!(!verify_digest(&other.public_hex(), &digest, &sig).unwrap());
    }

    #[test]
    fn test_minimal_hex_components_accepted() {
        let kp = KeyPair::generate();
        let digest = sha3_256(b"minimal hex");
        let sig = sign_digest(&kp, &digest).unwrap();

        // Strip leading zeros the way a big-number serializer would.
        let minimal = Signature {
            r: sig.r.trim_start_matches('0').to_string(),
            s: sig.s.trim_start_matches('0').to_string(),
        };
        assert!(verify_digest(&kp.public_hex(), &digest, &minimal).unwrap());
    }

    #[test]
    fn test_malformed_signature_is_error() {
        let kp = KeyPair::generate();
        let digest = sha3_256(b"data");
        let bad = Signature {
            r: "zzzz".into(),
            s: "00".into(),
        };
        assert!(verify_digest(&kp.public_hex(), &digest, &bad).is_err());
    }

    #[test]
    fn test_serde_shape() {
        let sig = Signature {
            r: "ab".into(),
            s: "cd".into(),
        };
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json, r#"{"r":"ab","s":"cd"}"#);
    }
}
