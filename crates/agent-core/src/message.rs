//! Conversation turn types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

impl Role {
    /// Stable string form, used as a storage column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Agent => "agent",
        }
    }
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Who produced this turn.
    pub role: Role,
    /// The agent this exchange was routed to.
    pub agent_id: String,
    /// Turn text.
    pub content: String,
    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    /// Create a user turn.
    pub fn user(
        agent_id: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            role: Role::User,
            agent_id: agent_id.into(),
            content: content.into(),
            timestamp,
        }
    }

    /// Create an agent turn.
    pub fn agent(
        agent_id: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            role: Role::Agent,
            agent_id: agent_id.into(),
            content: content.into(),
            timestamp,
        }
    }
}

/// One user turn and the agent turn that answered it.
///
/// Pairs are the unit of retention: stores keep at most `N` pairs per agent
/// and never split a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePair {
    pub user: ConversationMessage,
    pub agent: ConversationMessage,
}

impl MessagePair {
    /// Build a pair for one exchange with `agent_id`.
    ///
    /// Both turns carry the same agent id; the agent turn is stamped with
    /// `answered_at`, the user turn with `asked_at`.
    pub fn exchange(
        agent_id: &str,
        user_text: impl Into<String>,
        asked_at: DateTime<Utc>,
        agent_text: impl Into<String>,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user: ConversationMessage::user(agent_id, user_text, asked_at),
            agent: ConversationMessage::agent(agent_id, agent_text, answered_at),
        }
    }

    /// The agent this pair belongs to.
    pub fn agent_id(&self) -> &str {
        &self.agent.agent_id
    }

    /// The user's text.
    pub fn user_text(&self) -> &str {
        &self.user.content
    }

    /// The agent's reply.
    pub fn agent_text(&self) -> &str {
        &self.agent.content
    }
}
