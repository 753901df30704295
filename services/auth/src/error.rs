//! Error types for the identity service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the identity service
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing or malformed request fields
    #[error("{0}")]
    Validation(String),

    /// Unknown identifier or wrong password; deliberately not distinguished
    #[error("Invalid username/email or password")]
    InvalidCredentials,

    /// No usable identity on a guarded endpoint
    #[error("Unauthorized")]
    Unauthorized,

    /// Too many failed login attempts for this identifier
    #[error("Too many login attempts, try again later")]
    TooManyAttempts,

    /// A session row could not be verified as persisted
    #[error("Failed to establish session")]
    SessionPersistence,

    /// Unexpected datastore or infrastructure failure
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::Validation(_) | AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AuthError::SessionPersistence | AuthError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for handler results
pub type AuthResult<T> = Result<T, AuthError>;
