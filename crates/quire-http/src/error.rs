//! Error types for the settings API server.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quire_core::SettingsError;

/// Errors that can occur in the settings API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No value is stored at the requested key.
    #[error("not found: {0}")]
    NotFound(String),

    /// The domain or key in the path cannot be used.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The settings store failed.
    #[error("settings error: {0}")]
    Settings(SettingsError),
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::InvalidKey { .. } => Self::BadRequest(err.to_string()),
            SettingsError::Store(_) => Self::Settings(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Settings(e) => {
                tracing::error!(error = %e, "settings request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
