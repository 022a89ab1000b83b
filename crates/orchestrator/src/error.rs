//! Error types for routing operations.

use std::time::Duration;

use agent_core::{AgentError, ModelError};
use chat_storage::StorageError;
use thiserror::Error;

/// Errors that can end a routed request.
///
/// None of these reach the caller verbatim; the inbound boundary logs the
/// [`OrchestratorError::kind`] and answers with a generic failure.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Reading conversation history failed.
    #[error("conversation storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// The classifier model could not be reached or refused the request.
    #[error("classification failed after {attempts} attempt(s): {source}")]
    ClassificationFailed {
        attempts: u32,
        #[source]
        source: ModelError,
    },

    /// The classifier picked nothing usable and fallback is disabled.
    #[error("no agent identified for request")]
    NoAgentIdentified,

    /// The agent kept failing, or failed permanently.
    #[error("agent {agent_id} failed after {attempts} attempt(s): {source}")]
    AgentInvocationFailed {
        agent_id: String,
        attempts: u32,
        #[source]
        source: AgentError,
    },

    /// An agent attempt exceeded the configured deadline.
    #[error("agent {agent_id} did not answer within {timeout:?}")]
    AgentInvocationTimeout { agent_id: String, timeout: Duration },
}

impl OrchestratorError {
    /// Stable short name for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::StorageUnavailable(_) => "storage_unavailable",
            OrchestratorError::ClassificationFailed { .. } => "classification_failed",
            OrchestratorError::NoAgentIdentified => "no_agent_identified",
            OrchestratorError::AgentInvocationFailed { .. } => "agent_invocation_failed",
            OrchestratorError::AgentInvocationTimeout { .. } => "agent_invocation_timeout",
        }
    }
}

/// Invalid or inconsistent router configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    /// The values parsed but do not make sense together.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while building or querying the agent registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate agent id: {0}")]
    DuplicateId(String),

    #[error("agent not found: {0}")]
    NotFound(String),

    #[error("no agents registered")]
    Empty,
}
