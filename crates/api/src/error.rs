//! Error types for the inbound boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orchestrator::OrchestratorError;
use thiserror::Error;

/// The only error body callers ever see.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Errors that can end an inbound request.
///
/// Every variant maps to the same generic 500; the detail only reaches the logs.
#[derive(Debug, Error)]
pub enum AppError {
    /// The event could not be read.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// The routing pipeline failed.
    #[error(transparent)]
    Routing(#[from] OrchestratorError),

    /// The routing task panicked or was cancelled.
    #[error("Routing task aborted: {0}")]
    Aborted(String),

    /// The response body could not be encoded.
    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl AppError {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidEvent(_) => "invalid_event",
            AppError::Routing(err) => err.kind(),
            AppError::Aborted(_) => "aborted",
            AppError::Encode(_) => "encode",
        }
    }

    /// The client-visible body for any failure.
    pub fn body() -> serde_json::Value {
        serde_json::json!({ "error": INTERNAL_SERVER_ERROR })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(kind = self.kind(), "Request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(Self::body())).into_response()
    }
}

/// Result type for inbound operations.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_passes_through_routing_errors() {
        let err = AppError::from(OrchestratorError::NoAgentIdentified);
        assert_eq!(err.kind(), "no_agent_identified");
        assert_eq!(AppError::Aborted("panic".into()).kind(), "aborted");
    }

    #[test]
    fn test_into_response_hides_detail() {
        let response = AppError::InvalidEvent("missing query".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::body()["error"], "Internal Server Error");
    }
}
