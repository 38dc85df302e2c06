//! Error types for wnote-server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use wnote_common::auth::AuthError;

use crate::services::LookupError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, invalid, expired or unknown-subject credential (401)
    ///
    /// The response never says which.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Login rejected (401)
    #[error("Invalid credentials")]
    InvalidLogin,

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// External service failed (502)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// wnote-common error
    #[error("Common error: {0}")]
    Common(#[from] wnote_common::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredential(fault) => {
                warn!(fault = %fault, "Rejected credential");
                ApiError::Unauthenticated
            }
            AuthError::UnknownSubject(subject) => {
                warn!(subject = %subject, "Credential subject has no account");
                ApiError::Unauthenticated
            }
            AuthError::Signing(msg) => ApiError::Internal(msg),
            AuthError::Directory(e) => ApiError::Common(e),
        }
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Not authenticated".to_string(),
            ),
            ApiError::InvalidLogin => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Invalid credentials".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
            ApiError::Common(wnote_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            ApiError::Common(ref err) => {
                error!("Common error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMMON_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
