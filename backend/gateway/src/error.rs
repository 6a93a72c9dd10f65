use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use scanforge_extraction::ExtractionError;
use scanforge_resilience::ResilienceError;

/// API-boundary error: every variant maps to a status code and a
/// structured `{status: "error", message}` body. Internal detail stays
/// out of the wire message.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    RateLimited { retry_after_ms: u64 },
    CircuitOpen { retry_after_ms: u64 },
    UpstreamFailed(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::RateLimited { retry_after_ms } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!("rate limit exceeded, retry in {retry_after_ms}ms"),
            ),
            ApiError::CircuitOpen { retry_after_ms } => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("upstream capability unavailable, retry in {retry_after_ms}ms"),
            ),
            ApiError::UpstreamFailed(message) => (StatusCode::BAD_GATEWAY, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (
            status,
            Json(json!({"status": "error", "message": message})),
        )
            .into_response()
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::BadInput(message) => ApiError::BadRequest(message),
            ExtractionError::Admission(ResilienceError::RateLimited {
                retry_after_ms, ..
            }) => ApiError::RateLimited { retry_after_ms },
            ExtractionError::Admission(ResilienceError::CircuitOpen {
                retry_after_ms, ..
            }) => ApiError::CircuitOpen { retry_after_ms },
            // Timeout/Upstream never arrive as Admission, but the match
            // must stay total.
            ExtractionError::Admission(other) => ApiError::UpstreamFailed(other.to_string()),
            ExtractionError::InvalidSchema(message) => ApiError::UpstreamFailed(message),
            ExtractionError::Upstream(message) => ApiError::UpstreamFailed(message),
        }
    }
}
