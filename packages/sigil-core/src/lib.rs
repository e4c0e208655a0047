//! # Sigil Core
//!
//! End-to-end encrypted messaging protocol: deterministic identity keys,
//! challenge-response authentication, signed and encrypted messages, and
//! trust-on-first-use key tracking. The relay that carries messages never
//! sees plaintext, passwords, or private keys.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       SIGIL CORE MODULES                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────┐  ┌──────────┐  │
//! │  │  Identity  │  │    Auth    │  │  Message   │  │  Trust   │  │
//! │  │            │  │            │  │            │  │          │  │
//! │  │ - Derive   │  │ - Nonce    │  │ - Compose  │  │ - TOFU   │  │
//! │  │ - Finger-  │  │ - Sign     │  │ - Process  │  │ - Key    │  │
//! │  │   prints   │  │ - Verify   │  │ - Log      │  │   change │  │
//! │  └─────┬──────┘  └─────┬──────┘  └─────┬──────┘  └────┬─────┘  │
//! │        │               │               │              │        │
//! │        └───────────────┴───────┬───────┴──────────────┘        │
//! │                                │                               │
//! │  ┌─────────────────────────────▼────────────────────────────┐  │
//! │  │                        Crypto                            │  │
//! │  │  secp256k1 keys │ SHA3-256 │ ECDSA │ ECDH + AES-256-GCM  │  │
//! │  └──────────────────────────────────────────────────────────┘  │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Cryptographic primitives (keys, hashing, signing, encryption)
//! - [`identity`] - Credential-derived identity keys and fingerprints
//! - [`auth`] - Challenge-response authentication
//! - [`message`] - Message composition, verification, and local logging
//! - [`trust`] - Trust-on-first-use key tracking
//!
//! ## Security Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        SECURITY LAYERS                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  Layer 1: Identity (deterministic secp256k1)                    │
//! │  ──────────────────────────────────────────                     │
//! │  Keys derive from SHA3-256("{username}:{password}") so the      │
//! │  same credentials reproduce the same identity on any device.    │
//! │  Passwords and private keys never leave the client.             │
//! │                                                                 │
//! │  Layer 2: Authentication (challenge-response)                   │
//! │  ────────────────────────────────────────────                   │
//! │  Login signs a single-use server nonce; no password or key is   │
//! │  transmitted, and nonces cannot be replayed.                    │
//! │                                                                 │
//! │  Layer 3: Confidentiality (ECDH + AES-256-GCM)                  │
//! │  ─────────────────────────────────────────────                  │
//! │  Each pair of users shares a key derived from ECDH; the relay   │
//! │  forwards only ciphertext.                                      │
//! │                                                                 │
//! │  Layer 4: Authenticity (ECDSA over canonical hash)              │
//! │  ─────────────────────────────────────────────────              │
//! │  Receivers verify signatures against a hash they recompute      │
//! │  from decrypted content, so the relay cannot forge or alter     │
//! │  messages undetected.                                           │
//! │                                                                 │
//! │  Layer 5: Key continuity (trust-on-first-use)                   │
//! │  ────────────────────────────────────────────                   │
//! │  A changed counterparty key is surfaced to the user and never   │
//! │  accepted silently.                                             │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod auth;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod message;
pub mod trust;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use auth::{sign_challenge, Authenticator};
pub use crypto::{KeyPair, Signature};
pub use error::{Error, Result};
pub use identity::{derive_keypair, format_fingerprint, key_fingerprint};
pub use message::{
    compose_outgoing, process_incoming, MessagePayload, ProcessedMessage, VerificationStatus,
};
pub use trust::{KeyRecord, Observation, TrustStore};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Sigil Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================
