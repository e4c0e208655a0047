//! API error responses.
//!
//! Every handler failure renders as `{"error": "..."}` with the
//! matching HTTP status. Authentication failures are deliberately
//! uniform so callers cannot distinguish unknown users from bad
//! signatures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// A handler-level failure with its HTTP mapping.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m)
            | ApiError::Internal(m) => m,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = self.message(), "request failed");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<sigil_core::Error> for ApiError {
    fn from(err: sigil_core::Error) -> Self {
        use sigil_core::Error;
        match err {
            Error::InvalidInput(m) | Error::InvalidKey(m) | Error::InvalidFormat(m) => {
                ApiError::BadRequest(m)
            }
            Error::Unauthorized(m) => ApiError::Unauthorized(m),
            Error::NotFound(m) => ApiError::NotFound(m),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
