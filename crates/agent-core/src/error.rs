//! Error types for agent and model calls.

use std::time::Duration;

use thiserror::Error;

/// Errors an agent backend can return from [`crate::Agent::invoke`].
///
/// The router retries only the variants for which [`AgentError::is_transient`]
/// returns `true`.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent is temporarily unavailable (throttled, 5xx, connection reset).
    #[error("agent unavailable: {0}")]
    Unavailable(String),

    /// A network-level failure before a response was received.
    #[error("network error: {0}")]
    Network(String),

    /// The call exceeded its deadline.
    #[error("agent call timed out after {0:?}")]
    Timeout(Duration),

    /// The agent refused the request. Retrying with the same input will not help.
    #[error("agent rejected request: {0}")]
    Rejected(String),

    /// The agent answered but the answer could not be understood.
    #[error("invalid agent response: {0}")]
    InvalidResponse(String),

    /// The backend is misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AgentError {
    /// Whether the same call may succeed if attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AgentError::Unavailable(_) | AgentError::Network(_) | AgentError::Timeout(_)
        )
    }
}

/// Errors from the classifier model collaborator.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model endpoint is temporarily unavailable.
    #[error("model unavailable: {0}")]
    Unavailable(String),

    /// A network-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The model endpoint rejected the request.
    #[error("model rejected request: {0}")]
    Rejected(String),

    /// The response body could not be decoded.
    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    /// The model client is misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ModelError {
    /// Whether the same call may succeed if attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(self, ModelError::Unavailable(_) | ModelError::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_transience() {
        assert!(AgentError::Unavailable("throttled".into()).is_transient());
        assert!(AgentError::Network("reset".into()).is_transient());
        assert!(AgentError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(!AgentError::Rejected("bad input".into()).is_transient());
        assert!(!AgentError::InvalidResponse("garbage".into()).is_transient());
        assert!(!AgentError::Configuration("missing id".into()).is_transient());
    }

    #[test]
    fn test_model_error_transience() {
        assert!(ModelError::Unavailable("503".into()).is_transient());
        assert!(ModelError::Network("dns".into()).is_transient());
        assert!(!ModelError::Rejected("401".into()).is_transient());
        assert!(!ModelError::InvalidResponse("no choices".into()).is_transient());
    }
}
