//! In-process conversation store.
//!
//! Sessions live in an insertion-ordered map. Appends move the session to
//! the back, so the front is always the least recently written session and
//! is evicted first once the session limit is exceeded.

use std::sync::Arc;

use agent_core::MessagePair;
use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::clock::{expiry_millis, Clock};
use crate::error::Result;
use crate::{ConversationStore, RetentionPolicy, SessionKey};

/// Default maximum number of sessions to track before LRU eviction.
const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug, Default)]
struct SessionRecord {
    /// Shared log, oldest first.
    pairs: Vec<StoredPair>,
    /// Unix millis after which the record is logically absent.
    expires_at: i64,
}

impl SessionRecord {
    fn is_expired(&self, now_millis: i64) -> bool {
        now_millis >= self.expires_at
    }
}

#[derive(Debug, Clone)]
struct StoredPair {
    agent_id: String,
    pair: MessagePair,
}

/// Conversation store held in process memory.
///
/// Suitable for single-process deployments and tests. History is lost on
/// restart. The map lock is never held across an await point other than
/// acquiring it.
#[derive(Debug)]
pub struct MemoryStore {
    sessions: RwLock<IndexMap<SessionKey, SessionRecord>>,
    policy: RetentionPolicy,
    clock: Arc<dyn Clock>,
    max_sessions: usize,
}

impl MemoryStore {
    /// Create a store with the default session limit (10,000).
    pub fn new(policy: RetentionPolicy, clock: Arc<dyn Clock>) -> Self {
        Self::with_max_sessions(policy, clock, DEFAULT_MAX_SESSIONS)
    }

    /// Create a store that evicts the least recently written session once
    /// more than `max_sessions` are tracked.
    pub fn with_max_sessions(
        policy: RetentionPolicy,
        clock: Arc<dyn Clock>,
        max_sessions: usize,
    ) -> Self {
        Self {
            sessions: RwLock::new(IndexMap::new()),
            policy,
            clock,
            max_sessions,
        }
    }

    /// The retention policy in force.
    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Number of session records currently held, expired or not.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Drop the oldest pairs of `agent_id` until at most `cap` remain.
fn enforce_cap(pairs: &mut Vec<StoredPair>, agent_id: &str, cap: usize) {
    let held = pairs.iter().filter(|p| p.agent_id == agent_id).count();
    let mut excess = held.saturating_sub(cap);
    if excess == 0 {
        return;
    }
    pairs.retain(|p| {
        if excess > 0 && p.agent_id == agent_id {
            excess -= 1;
            false
        } else {
            true
        }
    });
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn load(
        &self,
        user_id: &str,
        session_id: &str,
        agent_id: &str,
    ) -> Result<Vec<MessagePair>> {
        let key = SessionKey::new(user_id, session_id);
        let now = self.clock.now_millis();
        let sessions = self.sessions.read().await;

        let Some(record) = sessions.get(&key).filter(|r| !r.is_expired(now)) else {
            return Ok(Vec::new());
        };

        let mut pairs: Vec<MessagePair> = record
            .pairs
            .iter()
            .rev()
            .filter(|p| p.agent_id == agent_id)
            .take(self.policy.max_pairs_per_agent)
            .map(|p| p.pair.clone())
            .collect();
        pairs.reverse();
        Ok(pairs)
    }

    async fn load_session(&self, user_id: &str, session_id: &str) -> Result<Vec<MessagePair>> {
        let key = SessionKey::new(user_id, session_id);
        let now = self.clock.now_millis();
        let sessions = self.sessions.read().await;

        Ok(sessions
            .get(&key)
            .filter(|r| !r.is_expired(now))
            .map(|r| r.pairs.iter().map(|p| p.pair.clone()).collect())
            .unwrap_or_default())
    }

    async fn append(
        &self,
        user_id: &str,
        session_id: &str,
        agent_id: &str,
        pair: MessagePair,
    ) -> Result<()> {
        let key = SessionKey::new(user_id, session_id);
        let now = self.clock.now_millis();
        let mut sessions = self.sessions.write().await;

        // Remove and re-insert to move to end (mark as recently used)
        let mut record = sessions.shift_remove(&key).unwrap_or_default();
        if record.is_expired(now) && !record.pairs.is_empty() {
            debug!(user_id, session_id, "Session expired, starting fresh log");
            record.pairs.clear();
        }

        record.pairs.push(StoredPair {
            agent_id: agent_id.to_string(),
            pair,
        });
        enforce_cap(&mut record.pairs, agent_id, self.policy.max_pairs_per_agent);
        record.expires_at = expiry_millis(now, self.policy.ttl);

        sessions.insert(key, record);

        // LRU eviction: remove oldest entries if we exceed max_sessions
        while sessions.len() > self.max_sessions {
            sessions.shift_remove_index(0);
        }

        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = self.clock.now_millis();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
