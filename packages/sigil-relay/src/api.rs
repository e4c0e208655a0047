//! HTTP API handlers.
//!
//! The relay exposes a small JSON API:
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `POST /auth/register` | Claim a username and bind a public key |
//! | `POST /auth/challenge` | Obtain a login nonce |
//! | `POST /auth/login` | Exchange a signed nonce for a bearer token |
//! | `GET /users/:username` | Look up a user's public key |
//! | `POST /messages` | Submit a signed, encrypted message |
//! | `GET /messages/:partner` | Fetch a conversation |
//!
//! Message submission is guarded twice: the bearer session must match
//! the claimed sender, and the attached signature must verify over the
//! transmitted hash under the sender's *registered* key. The relay
//! never sees plaintext, so it cannot recompute the hash itself; that
//! stronger check belongs to the receiving client.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sigil_core::crypto::{parse_public_hex, verify_digest, DIGEST_SIZE};
use sigil_core::message::validate_timestamp;
use sigil_core::{MessagePayload, Signature};

use crate::error::ApiError;
use crate::state::{RelayState, Session, StoredMessage};

// ── Request / Response Types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub username: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub nonce: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub signature: Signature,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// Only messages whose timestamp is strictly after this instant
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: u64,
    #[serde(flatten)]
    pub payload: MessagePayload,
    #[serde(rename = "receivedAt")]
    pub received_at: DateTime<Utc>,
}

impl From<StoredMessage> for MessageResponse {
    fn from(stored: StoredMessage) -> Self {
        Self {
            id: stored.id,
            payload: stored.payload,
            received_at: stored.received_at,
        }
    }
}

// ── Auth Helpers ──────────────────────────────────────────────────────────────

/// Resolve the bearer token in the Authorization header to a session.
fn require_session(state: &RelayState, headers: &HeaderMap) -> Result<Session, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".into()))?;
    state
        .authenticate(token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".into()))
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `POST /auth/register` — claim a username and bind a public key to it.
pub async fn register(
    State(state): State<RelayState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username must not be empty".into()));
    }
    parse_public_hex(&req.public_key)
        .map_err(|e| ApiError::BadRequest(format!("Invalid public key: {}", e)))?;

    let user = state
        .register_user(username, &req.public_key)
        .ok_or_else(|| ApiError::Conflict(format!("Username '{}' is taken", username)))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            username: user.username,
            public_key: user.public_key,
        }),
    ))
}

/// `POST /auth/challenge` — issue a single-use login nonce.
pub async fn challenge(
    State(state): State<RelayState>,
    Json(req): Json<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let user = state
        .user(req.username.trim())
        .ok_or_else(|| ApiError::NotFound(format!("No such user '{}'", req.username.trim())))?;
    let nonce = state.authenticator.challenge(user.id);
    Ok(Json(ChallengeResponse { nonce }))
}

/// `POST /auth/login` — verify a signed nonce, mint a bearer token.
///
/// Every refusal is a bare 401; unknown usernames, missing challenges,
/// and bad signatures are indistinguishable from outside.
pub async fn login(
    State(state): State<RelayState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .user(req.username.trim())
        .ok_or_else(|| ApiError::Unauthorized("Authentication failed".into()))?;

    state
        .authenticator
        .login(user.id, &user.public_key, &req.signature)
        .map_err(|_| ApiError::Unauthorized("Authentication failed".into()))?;

    let access_token = state.issue_token(&user);
    Ok(Json(LoginResponse { access_token }))
}

/// `GET /users/:username` — fetch a user's public key.
pub async fn get_user(
    State(state): State<RelayState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user(&username)
        .ok_or_else(|| ApiError::NotFound(format!("No such user '{}'", username)))?;
    Ok(Json(UserResponse {
        username: user.username,
        public_key: user.public_key,
    }))
}

/// `POST /messages` — accept a signed, encrypted message for delivery.
pub async fn send_message(
    State(state): State<RelayState>,
    headers: HeaderMap,
    Json(payload): Json<MessagePayload>,
) -> Result<(StatusCode, Json<SendResponse>), ApiError> {
    let session = require_session(&state, &headers)?;

    // The session identity must match the claimed sender.
    if session.username != payload.sender_username {
        return Err(ApiError::Unauthorized(
            "Sender does not match authenticated user".into(),
        ));
    }

    let sender = state
        .user(&payload.sender_username)
        .ok_or_else(|| ApiError::Unauthorized("Sender not registered".into()))?;
    let receiver = state.user(&payload.receiver_username).ok_or_else(|| {
        ApiError::NotFound(format!("No such user '{}'", payload.receiver_username))
    })?;

    validate_timestamp(&payload.timestamp)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    // The signature must verify over the transmitted hash under the
    // sender's registered key. This rejects forged submissions without
    // ever seeing the plaintext.
    let digest = decode_digest_hex(&payload.message_hash)?;
    let ok = verify_digest(&sender.public_key, &digest, &payload.signature)
        .map_err(|e| ApiError::BadRequest(format!("Malformed signature: {}", e)))?;
    if !ok {
        return Err(ApiError::Unauthorized(
            "Signature does not verify for sender".into(),
        ));
    }

    let id = state.store_message(sender.id, receiver.id, payload);
    tracing::info!(message_id = id, "message accepted");
    Ok((StatusCode::CREATED, Json(SendResponse { id })))
}

/// `GET /messages/:partner?since=` — fetch a conversation with a partner.
pub async fn get_messages(
    State(state): State<RelayState>,
    headers: HeaderMap,
    Path(partner): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let session = require_session(&state, &headers)?;
    let partner = state
        .user(&partner)
        .ok_or_else(|| ApiError::NotFound(format!("No such user '{}'", partner)))?;

    let messages = state
        .conversation(session.user_id, partner.id, query.since)
        .into_iter()
        .map(MessageResponse::from)
        .collect();
    Ok(Json(messages))
}

fn decode_digest_hex(hash_hex: &str) -> Result<[u8; DIGEST_SIZE], ApiError> {
    let bytes = hex::decode(hash_hex)
        .map_err(|_| ApiError::BadRequest("Message hash must be hex".into()))?;
    bytes
        .try_into()
        .map_err(|_| ApiError::BadRequest("Message hash must be 32 bytes".into()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
