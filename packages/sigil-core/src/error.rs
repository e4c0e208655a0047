//! # Error Handling
//!
//! Error types for the Sigil protocol core.
//!
//! The taxonomy deliberately collapses detail at trust boundaries:
//! every authentication failure surfaces as [`Error::Unauthorized`]
//! without distinguishing which check failed, and primitive crypto
//! library errors are translated here before they reach a caller.
//!
//! Two failure kinds during decryption must stay distinguishable:
//! [`Error::InvalidFormat`] (the envelope could not be parsed at all)
//! and [`Error::DecryptionFailed`] (the AEAD tag did not verify).
//! Consumers map both to a terminal `Corrupted` message status, never
//! a crash.

use thiserror::Error;

/// Result type alias for Sigil core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Sigil protocol core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Input / Identity Errors
    // ========================================================================

    /// Malformed request shape reaching the core. Rejected before any
    /// crypto operation runs.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Referenced identity (username) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication or signature check failed. Deliberately does not
    /// distinguish sub-causes (missing nonce, wrong signature, unknown
    /// user) to the caller.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // ========================================================================
    // Crypto Errors
    // ========================================================================

    /// Invalid key format or length
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Key derivation failed (degenerate scalar from the hash output)
    #[error("Failed to derive keys: {0}")]
    KeyDerivationFailed(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// AEAD authentication failed during message decryption
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Envelope or payload structurally unparseable
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Signing operation failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    // ========================================================================
    // Internal Errors
    // ========================================================================

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Failed to read or write persisted state (trust store)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl Error {
    /// Whether this error is a terminal per-message state rather than a
    /// caller bug: the receiving side maps these to `Corrupted` instead
    /// of propagating.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::DecryptionFailed(_) | Error::InvalidFormat(_)
        )
    }
}
