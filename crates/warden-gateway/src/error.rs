//! JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;
use warden_core::WardenError;

/// An HTTP status with a short message, rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    /// Response status.
    pub status: StatusCode,
    /// Human readable reason.
    pub message: String,
}

impl ApiError {
    /// Build an error response.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// 403.
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden")
    }

    /// 404.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<WardenError> for ApiError {
    fn from(err: WardenError) -> Self {
        let status = match &err {
            WardenError::InvalidInput(_) | WardenError::AlreadyRegistered(_) => {
                StatusCode::BAD_REQUEST
            }
            WardenError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            WardenError::NotFound | WardenError::Expired | WardenError::Unauthenticated => {
                StatusCode::FORBIDDEN
            }
            WardenError::UserNotFound(_) => StatusCode::NOT_FOUND,
            WardenError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            WardenError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %err, "Request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
