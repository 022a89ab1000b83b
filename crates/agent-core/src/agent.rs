//! The Agent trait definition.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::message::MessagePair;

/// Routing-facing description of an agent.
///
/// The classifier only ever sees descriptors; the backend behind an id is
/// opaque to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Unique identifier, also what the classifier must answer with.
    pub id: String,
    /// Human-readable name returned to callers.
    pub name: String,
    /// What the agent handles, written for the classifier.
    pub description: String,
}

impl AgentDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Input handed to an agent for one turn.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    /// The user's utterance, unmodified.
    pub user_input: String,
    /// Caller identity.
    pub user_id: String,
    /// Conversation the turn belongs to.
    pub session_id: String,
    /// Prior exchanges with this agent in this session, oldest first.
    pub history: Vec<MessagePair>,
}

impl AgentRequest {
    pub fn new(
        user_input: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            user_input: user_input.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            history: Vec::new(),
        }
    }

    /// Attach prior exchanges.
    pub fn with_history(mut self, history: Vec<MessagePair>) -> Self {
        self.history = history;
        self
    }
}

/// An agent's answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentResponse {
    /// Full answer text. For streaming agents this is the accumulated text
    /// after the stream was delivered through the agent's own channel.
    pub output: String,
    /// Whether the answer was streamed to the user out-of-band.
    pub streaming: bool,
    /// Backend-specific metadata (trace ids, citations, ...).
    pub metadata: HashMap<String, String>,
}

impl AgentResponse {
    /// A fully materialized text answer.
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            streaming: false,
            metadata: HashMap::new(),
        }
    }

    /// An answer that was streamed; `accumulated` is kept for history.
    pub fn streamed(accumulated: impl Into<String>) -> Self {
        Self {
            output: accumulated.into(),
            streaming: true,
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A backend capable of answering a routed request.
///
/// Implementations range from remote agent runtimes to in-process echo
/// agents. This trait is object-safe and is stored as `Arc<dyn Agent>`.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Answer one turn.
    ///
    /// Return a transient [`AgentError`] (see [`AgentError::is_transient`])
    /// when the router may retry with the same request.
    async fn invoke(&self, request: AgentRequest) -> Result<AgentResponse, AgentError>;

    /// Short backend kind used in logs (e.g. "http", "echo").
    fn kind(&self) -> &str;

    /// Check if the backend is ready to take requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}
