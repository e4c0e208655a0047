//! Server state management.
//!
//! Tracks registered users, stored ciphertext, pending challenges, and
//! bearer-token sessions. All data structures are concurrent (DashMap)
//! for lock-free access. The relay holds only what it needs to forward
//! messages: usernames, public keys, and opaque envelopes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use sigil_core::auth::Authenticator;
use sigil_core::MessagePayload;

/// Default bearer token TTL in seconds (1 hour).
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Port to listen on
    pub port: u16,
    /// Bearer token lifetime in seconds
    pub token_ttl_secs: i64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

/// A registered user.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    /// SEC1 uncompressed public key hex
    pub public_key: String,
}

/// A stored message between two users.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub id: u64,
    pub payload: MessagePayload,
    /// When the relay accepted the message
    pub received_at: DateTime<Utc>,
}

/// An authenticated session behind a bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: u64,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Shared server state.
#[derive(Clone)]
pub struct RelayState {
    /// Username → registered user.
    pub users: Arc<DashMap<String, UserRecord>>,

    /// Normalized user-id pair → conversation messages.
    /// The key is (min, max) so both directions share one vector.
    pub messages: Arc<DashMap<(u64, u64), Vec<StoredMessage>>>,

    /// Bearer token → session.
    pub sessions: Arc<DashMap<String, Session>>,

    /// Pending login challenges, keyed by user id.
    pub authenticator: Arc<Authenticator>,

    /// Server configuration.
    pub config: RelayConfig,

    next_user_id: Arc<AtomicU64>,
    next_message_id: Arc<AtomicU64>,
}

impl RelayState {
    /// Create a new relay state with the given configuration.
    pub fn new(config: RelayConfig) -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            messages: Arc::new(DashMap::new()),
            sessions: Arc::new(DashMap::new()),
            authenticator: Arc::new(Authenticator::new()),
            config,
            next_user_id: Arc::new(AtomicU64::new(1)),
            next_message_id: Arc::new(AtomicU64::new(1)),
        }
    }

    // ── User Management ───────────────────────────────────────────────────

    /// Register a user. Returns None when the username is taken.
    pub fn register_user(&self, username: &str, public_key: &str) -> Option<UserRecord> {
        match self.users.entry(username.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => None,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let record = UserRecord {
                    id: self.next_user_id.fetch_add(1, Ordering::Relaxed),
                    username: username.to_string(),
                    public_key: public_key.to_string(),
                };
                slot.insert(record.clone());
                tracing::info!(username, "user registered");
                Some(record)
            }
        }
    }

    /// Look up a user by username.
    pub fn user(&self, username: &str) -> Option<UserRecord> {
        self.users.get(username).map(|r| r.clone())
    }

    // ── Sessions ──────────────────────────────────────────────────────────

    /// Mint a bearer token for a user who passed the challenge.
    pub fn issue_token(&self, user: &UserRecord) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions.insert(
            token.clone(),
            Session {
                user_id: user.id,
                username: user.username.clone(),
                expires_at: Utc::now() + chrono::Duration::seconds(self.config.token_ttl_secs),
            },
        );
        tracing::info!(username = %user.username, "session issued");
        token
    }

    /// Resolve a bearer token to its session, enforcing expiry.
    pub fn authenticate(&self, token: &str) -> Option<Session> {
        let session = self.sessions.get(token)?.clone();
        if session.expires_at < Utc::now() {
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    /// Drop expired sessions. Called periodically.
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        // Counted inside retain: handlers insert sessions concurrently,
        // so a before/after length subtraction could go negative.
        let mut removed = 0usize;
        self.sessions.retain(|_, session| {
            let live = session.expires_at >= now;
            if !live {
                removed += 1;
            }
            live
        });
        if removed > 0 {
            tracing::debug!(removed, "expired sessions dropped");
        }
    }

    // ── Messages ──────────────────────────────────────────────────────────

    fn conversation_key(a: u64, b: u64) -> (u64, u64) {
        (a.min(b), a.max(b))
    }

    /// Store an accepted message.
    pub fn store_message(&self, sender_id: u64, receiver_id: u64, payload: MessagePayload) -> u64 {
        let id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
        self.messages
            .entry(Self::conversation_key(sender_id, receiver_id))
            .or_default()
            .push(StoredMessage {
                id,
                payload,
                received_at: Utc::now(),
            });
        id
    }

    /// Fetch a conversation's messages in timestamp order, optionally
    /// only those whose message timestamp is after `since`.
    ///
    /// Filtering and ordering both use the payload timestamp, so a
    /// client polling with the last timestamp it saw never receives an
    /// older message, regardless of when the relay accepted it.
    pub fn conversation(
        &self,
        a: u64,
        b: u64,
        since: Option<DateTime<Utc>>,
    ) -> Vec<StoredMessage> {
        let mut out: Vec<StoredMessage> = self
            .messages
            .get(&Self::conversation_key(a, b))
            .map(|v| v.clone())
            .unwrap_or_default();
        if let Some(cutoff) = since {
            // Timestamps were offset-validated at submit time.
            out.retain(|m| {
                DateTime::parse_from_rfc3339(&m.payload.timestamp)
                    .map(|ts| ts.with_timezone(&Utc) > cutoff)
                    .unwrap_or(false)
            });
        }
        out.sort_by(|x, y| x.payload.timestamp.cmp(&y.payload.timestamp));
        out
    }

    /// Total stored messages, for diagnostics.
    pub fn message_count(&self) -> usize {
        self.messages.iter().map(|entry| entry.value().len()).sum()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
