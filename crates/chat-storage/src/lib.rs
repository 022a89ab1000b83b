//! Conversation history storage for the agent router.
//!
//! A session is identified by `(user_id, session_id)` and holds one shared,
//! ordered log of [`MessagePair`]s across every agent the session talked to.
//! Reads filter that log by agent. Two invariants hold for every store:
//!
//! - **Retention**: at most `max_pairs_per_agent` pairs are kept per agent;
//!   appending beyond that drops the oldest pairs of that agent.
//! - **Expiry**: every append pushes the session's expiry to `now + ttl`.
//!   An expired session reads back as empty, never as an error.
//!
//! Two implementations are provided:
//!
//! - [`MemoryStore`] - in-process, LRU-bounded by session count
//! - [`SqliteStore`] - SQLx/SQLite, transactional append, survives restarts
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use agent_core::MessagePair;
//! use chat_storage::{ConversationStore, MemoryStore, RetentionPolicy, SystemClock};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> chat_storage::Result<()> {
//!     let store = MemoryStore::new(RetentionPolicy::default(), Arc::new(SystemClock));
//!     let now = chrono::Utc::now();
//!
//!     let pair = MessagePair::exchange("solar", "Output today?", now, "12 kWh", now);
//!     store.append("u1", "s1", "solar", pair).await?;
//!
//!     let history = store.load("u1", "s1", "solar").await?;
//!     assert_eq!(history.len(), 1);
//!     Ok(())
//! }
//! ```

mod clock;
mod error;
mod memory;
mod reaper;
mod sqlite;

use std::time::Duration;

use agent_core::MessagePair;
use async_trait::async_trait;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, StorageError};
pub use memory::MemoryStore;
pub use reaper::spawn_reaper;
pub use sqlite::SqliteStore;

/// Default number of message pairs kept per agent per session.
pub const DEFAULT_MAX_PAIRS_PER_AGENT: usize = 10;

/// Default session lifetime after the last append.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Retention settings shared by all stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Maximum pairs kept per agent in one session.
    pub max_pairs_per_agent: usize,
    /// Session lifetime, refreshed on every append.
    pub ttl: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_pairs_per_agent: DEFAULT_MAX_PAIRS_PER_AGENT,
            ttl: DEFAULT_TTL,
        }
    }
}

/// Identity of one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// Durable per-session message history.
///
/// Implementations must be safe to call concurrently, including concurrent
/// appends to the same session: no appended pair may be lost.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The most recent pairs exchanged with `agent_id`, oldest first.
    ///
    /// Returns an empty list for expired or unknown sessions.
    async fn load(&self, user_id: &str, session_id: &str, agent_id: &str)
        -> Result<Vec<MessagePair>>;

    /// Every retained pair in the session across all agents, oldest first.
    async fn load_session(&self, user_id: &str, session_id: &str) -> Result<Vec<MessagePair>>;

    /// Append one pair for `agent_id`, refresh the session expiry, and
    /// enforce the per-agent retention cap.
    async fn append(
        &self,
        user_id: &str,
        session_id: &str,
        agent_id: &str,
        pair: MessagePair,
    ) -> Result<()>;

    /// Physically remove expired sessions. Returns how many were removed.
    async fn purge_expired(&self) -> Result<u64>;

    /// Store name for logs.
    fn name(&self) -> &str;
}
