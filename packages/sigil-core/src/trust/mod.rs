//! # Trust Store
//!
//! Trust-on-first-use tracking of counterparty public keys. The first
//! key observed for a username is recorded; a later observation with a
//! different key is flagged, never silently accepted. Accepting the new
//! key is an explicit user decision ([`TrustStore::trust`]).
//!
//! The store persists as a JSON file so key history survives restarts.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identity::key_fingerprint;

/// What the store knows about one counterparty's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// SEC1 uncompressed public key hex
    pub public_key: String,
    /// Colon-separated fingerprint of the key
    pub fingerprint: String,
    /// When this username was first encountered
    pub first_seen: DateTime<Utc>,
    /// Most recent sighting of this key
    pub last_seen: DateTime<Utc>,
}

/// Result of observing a counterparty key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// True when the observed key differs from the recorded one
    pub changed: bool,
    /// The superseded record, present only when `changed`
    pub previous: Option<KeyRecord>,
}

/// Per-username key records, keyed by username.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TrustStore {
    records: HashMap<String, KeyRecord>,
}

impl TrustStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key sighting for a username.
    ///
    /// First sighting stores the key and reports no change. A matching
    /// key refreshes `last_seen`. A differing key reports
    /// `changed = true` with the previous record and leaves the store
    /// untouched; the caller must decide whether to [`trust`](Self::trust)
    /// the new key.
    pub fn observe(&mut self, username: &str, public_key_hex: &str) -> Observation {
        let now = Utc::now();
        match self.records.get_mut(username) {
            None => {
                self.records.insert(
                    username.to_string(),
                    KeyRecord {
                        public_key: public_key_hex.to_string(),
                        fingerprint: key_fingerprint(public_key_hex),
                        first_seen: now,
                        last_seen: now,
                    },
                );
                tracing::info!(username, "recorded first-seen key");
                Observation {
                    changed: false,
                    previous: None,
                }
            }
            Some(record) if record.public_key == public_key_hex => {
                record.last_seen = now;
                Observation {
                    changed: false,
                    previous: None,
                }
            }
            Some(record) => {
                tracing::warn!(
                    username,
                    old_fingerprint = %record.fingerprint,
                    new_fingerprint = %key_fingerprint(public_key_hex),
                    "counterparty key changed"
                );
                Observation {
                    changed: true,
                    previous: Some(record.clone()),
                }
            }
        }
    }

    /// Explicitly accept a (possibly changed) key for a username.
    ///
    /// `first_seen` is preserved from the existing record when present,
    /// keeping the history of when this username was first encountered.
    pub fn trust(&mut self, username: &str, public_key_hex: &str) {
        let now = Utc::now();
        let first_seen = self
            .records
            .get(username)
            .map(|r| r.first_seen)
            .unwrap_or(now);
        self.records.insert(
            username.to_string(),
            KeyRecord {
                public_key: public_key_hex.to_string(),
                fingerprint: key_fingerprint(public_key_hex),
                first_seen,
                last_seen: now,
            },
        );
        tracing::info!(username, "key explicitly trusted");
    }

    /// Drop the record for a username, resetting it to first-use state.
    pub fn forget(&mut self, username: &str) -> bool {
        self.records.remove(username).is_some()
    }

    /// The record for a username, if one exists.
    pub fn get(&self, username: &str) -> Option<&KeyRecord> {
        self.records.get(username)
    }

    /// Number of tracked usernames.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no usernames are tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Persist the store to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| Error::Storage(format!("Failed to write trust store: {}", e)))
    }

    /// Load a store from a JSON file. A missing file yields an empty
    /// store; a corrupt file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Storage(format!("Failed to read trust store: {}", e)))?;
        serde_json::from_str(&json)
            .map_err(|e| Error::Storage(format!("Trust store file is corrupt: {}", e)))
    }
}

// ============================================================================
// TESTS
// ============================================================================
