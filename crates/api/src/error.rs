//! Error types for the API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::{DatabaseError, ValidationError};
use thiserror::Error;

/// Errors surfaced to API callers.
///
/// Every variant maps to a status code and a JSON `{"error": ...}`
/// body; only internal failures hide their detail behind a generic
/// message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// Acting on a resource the caller doesn't own.
    #[error("{0}")]
    Forbidden(String),

    /// Malformed or inapplicable input.
    #[error("{0}")]
    BadRequest(String),

    /// Resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// State conflict (duplicate request, already friends, taken email).
    #[error("{0}")]
    Conflict(String),

    /// Input failed validation.
    #[error("{0}")]
    Unprocessable(String),

    /// Upload exceeds the size limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Upload has an unsupported media type.
    #[error("{0}")]
    UnsupportedMedia(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Unprocessable(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            ApiError::UnsupportedMedia(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg.clone()),
            ApiError::Database(DatabaseError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::Database(DatabaseError::AlreadyExists { .. }) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            ApiError::Database(DatabaseError::NotPending { .. }) => {
                (StatusCode::BAD_REQUEST, "Request already handled".to_string())
            }
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
