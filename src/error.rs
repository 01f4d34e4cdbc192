// Error handling module
// Defines error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API errors that can occur during request processing
#[derive(Error, Debug)]
pub enum ApiError {
    /// The identity provider rejected or cancelled the sign-in
    #[error("Authentication failed: {0}")]
    AuthProviderError(String),

    /// No credential present for a protected action.
    /// Answered with a redirect to the sign-in entry point, never an error body.
    #[error("Missing credential, sign in at {location}")]
    MissingCredential { location: String },

    /// Non-2xx or malformed response from the remote book API
    #[error("Remote API error: {status} - {message}")]
    RemoteCallFailure { status: u16, message: String },

    /// Resource not found upstream
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Short error category, used in logs and response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::AuthProviderError(_) => "auth_provider_error",
            ApiError::MissingCredential { .. } => "missing_credential",
            ApiError::RemoteCallFailure { .. } => "remote_call_failure",
            ApiError::NotFound(_) => "not_found",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_type = self.kind();
        let (status, message) = match self {
            ApiError::MissingCredential { location } => {
                tracing::debug!("Missing credential, redirecting to {}", location);
                return Redirect::to(&location).into_response();
            }
            ApiError::AuthProviderError(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::RemoteCallFailure { status, message } => {
                // Transport failures carry status 0 and surface as a bad gateway
                let status_code = StatusCode::from_u16(status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (status_code, message)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "type": error_type,
            }
        }));

        (status, body).into_response()
    }
}
