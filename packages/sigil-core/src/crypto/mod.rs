//! # Cryptographic Primitives
//!
//! Everything below is deterministic given its inputs except IV
//! generation in [`encryption`], which draws fresh randomness per call.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                  crypto                       │
//! ├───────────┬───────────┬───────────────────────┤
//! │   hash    │  signing  │      encryption       │
//! │ SHA3-256  │   ECDSA   │ ECDH + AES-256-GCM    │
//! ├───────────┴───────────┴───────────────────────┤
//! │              keys (secp256k1)                 │
//! └───────────────────────────────────────────────┘
//! ```

pub mod encryption;
pub mod hash;
pub mod keys;
pub mod signing;

pub use encryption::{decrypt, derive_shared_key, encrypt, IV_SIZE};
pub use hash::{sha3_256, sha3_256_hex, DIGEST_SIZE};
pub use keys::{parse_public_hex, KeyPair, PRIVATE_KEY_SIZE};
pub use signing::{sign_digest, verify_digest, Signature};
