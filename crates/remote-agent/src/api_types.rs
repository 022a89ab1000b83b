//! Wire types for the agent runtime and the chat-completion endpoint.

use std::collections::HashMap;

use agent_core::{MessagePair, Role};
use serde::{Deserialize, Serialize};

/// One prior turn forwarded to the agent runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    /// "user" or "agent"
    pub role: String,
    pub content: String,
}

impl HistoryTurn {
    /// Flatten pairs into alternating user/agent turns, oldest first.
    pub fn from_pairs(pairs: &[MessagePair]) -> Vec<Self> {
        pairs
            .iter()
            .flat_map(|pair| [&pair.user, &pair.agent])
            .map(|message| Self {
                role: message.role.as_str().to_string(),
                content: message.content.clone(),
            })
            .collect()
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User.as_str()
    }
}

/// Body POSTed to `{runtime}/invoke`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeAgentRequest {
    pub agent_id: String,
    pub alias_id: String,
    pub user_id: String,
    pub session_id: String,
    pub input_text: String,
    pub history: Vec<HistoryTurn>,
}

/// Body returned by the agent runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeAgentResponse {
    /// Final (or accumulated, when streamed) answer text.
    pub output: String,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    /// Role: "system" or "user"
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

/// Chat completion response. Only the fields the classifier needs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResponseMessage {
    /// May be null when the model answered with tool calls only.
    pub content: Option<String>,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiError {
    pub error: ApiErrorDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorDetails {
    pub message: String,
}
