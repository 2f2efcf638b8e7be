//! Error-to-HTTP response conversion.

use anibridge_library::Error;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError(pub Error);

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Webhook handling failed");
        } else {
            tracing::debug!(status = %status, error = %self.0, "Rejected webhook");
        }

        let code = match &self.0 {
            Error::Config(_) => "config_error",
            Error::NotInitialized => "not_initialized",
            Error::NotFound { .. } => "not_found",
            Error::Http { .. } => "http_error",
            Error::Api { .. } => "api_error",
            Error::Webhook(_) => "invalid_webhook",
            Error::UnsupportedMediaType(_) => "unsupported_media_type",
            Error::MissingParent { .. } => "missing_parent",
        };

        let body = json!({
            "error": self.0.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
