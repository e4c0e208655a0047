//! Sigil Relay Server
//!
//! A lightweight HTTP relay for Sigil encrypted messaging:
//!
//! 1. **Registration**: Users claim a username and bind their public key
//!    to it. The relay never sees passwords or private keys.
//!
//! 2. **Challenge-response login**: Clients prove key ownership by
//!    signing a single-use nonce, and receive a bearer token.
//!
//! 3. **Message forwarding**: Signed, encrypted messages are stored per
//!    conversation and served to either participant.
//!
//! **Privacy**: All E2E encryption happens client-side — the relay only
//! handles opaque ciphertext envelopes and signature metadata.

mod api;
mod error;
mod state;

use std::time::Duration;

use axum::http::Method;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{extract::State, Json, Router};
use clap::Parser;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::{RelayConfig, RelayState};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sigil-relay", version, about = "Sigil encrypted messaging relay")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080, env = "RELAY_PORT")]
    port: u16,

    /// Bearer token TTL in seconds
    #[arg(long, default_value_t = 3600, env = "TOKEN_TTL_SECS")]
    token_ttl_secs: i64,

    /// Cleanup interval in seconds
    #[arg(long, default_value_t = 300, env = "CLEANUP_INTERVAL_SECS")]
    cleanup_interval_secs: u64,
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sigil_relay=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = RelayConfig {
        port: args.port,
        token_ttl_secs: args.token_ttl_secs,
    };
    let state = RelayState::new(config);

    // Spawn periodic session cleanup task
    let cleanup_state = state.clone();
    let cleanup_interval = args.cleanup_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(cleanup_interval));
        loop {
            interval.tick().await;
            cleanup_state.cleanup_expired();
        }
    });

    // Build router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/auth/register", post(api::register))
        .route("/auth/challenge", post(api::challenge))
        .route("/auth/login", post(api::login))
        .route("/users/:username", get(api::get_user))
        .route("/messages", post(api::send_message))
        .route("/messages/:partner", get(api::get_messages))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Sigil relay server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

// ── Route Handlers ────────────────────────────────────────────────────────────

/// Health check endpoint.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "sigil-relay",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Statistics endpoint.
async fn stats_handler(State(state): State<RelayState>) -> impl IntoResponse {
    Json(json!({
        "registered_users": state.users.len(),
        "stored_messages": state.message_count(),
        "active_sessions": state.sessions.len(),
        "pending_challenges": state.authenticator.pending(),
    }))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_json_structure() {
        let json_val = json!({
            "status": "ok",
            "service": "sigil-relay",
            "version": env!("CARGO_PKG_VERSION"),
        });
        assert_eq!(json_val["status"], "ok");
        assert_eq!(json_val["service"], "sigil-relay");
    }

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.token_ttl_secs, 3600);
    }

    #[tokio::test]
    async fn test_state_creation() {
        let state = RelayState::new(RelayConfig::default());
        assert_eq!(state.users.len(), 0);
        assert_eq!(state.message_count(), 0);
    }
}
