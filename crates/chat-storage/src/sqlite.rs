//! SQLite-backed conversation store.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use agent_core::{ConversationMessage, MessagePair};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};

use crate::clock::{expiry_millis, Clock};
use crate::error::{Result, StorageError};
use crate::{ConversationStore, RetentionPolicy};

#[derive(Debug, FromRow)]
struct PairRow {
    agent_id: String,
    user_content: String,
    user_at: i64,
    agent_content: String,
    agent_at: i64,
}

impl PairRow {
    fn into_pair(self) -> Result<MessagePair> {
        let user_at = millis_to_datetime(self.user_at)?;
        let agent_at = millis_to_datetime(self.agent_at)?;
        Ok(MessagePair {
            user: ConversationMessage::user(&self.agent_id, self.user_content, user_at),
            agent: ConversationMessage::agent(self.agent_id, self.agent_content, agent_at),
        })
    }
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StorageError::Corrupt(format!("timestamp out of range: {}", millis)))
}

/// Conversation store persisted in SQLite.
///
/// Each append runs in one transaction: expire-and-reset, expiry refresh,
/// insert, and retention trim either all happen or none do. SQLite
/// serialises writers, so concurrent appends to one session never lose a
/// pair; ordering follows commit order.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    policy: RetentionPolicy,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database and run migrations.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    pub async fn connect(
        url: &str,
        policy: RetentionPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE, policy, clock).await
    }

    /// Connect with a custom pool size.
    pub async fn connect_with_pool_size(
        url: &str,
        pool_size: u32,
        policy: RetentionPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to conversation store: {} (pool size: {})", url, pool_size);

        let store = Self { pool, policy, clock };
        store.migrate().await?;
        Ok(store)
    }

    /// Open a private in-memory database.
    ///
    /// Uses a single connection that is never recycled, since every
    /// connection to `sqlite::memory:` sees its own database.
    pub async fn in_memory(policy: RetentionPolicy, clock: Arc<dyn Clock>) -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool, policy, clock };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        tracing::debug!("Running conversation store migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The retention policy in force.
    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn cap(&self) -> i64 {
        i64::try_from(self.policy.max_pairs_per_agent).unwrap_or(i64::MAX)
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn load(
        &self,
        user_id: &str,
        session_id: &str,
        agent_id: &str,
    ) -> Result<Vec<MessagePair>> {
        let rows = sqlx::query_as::<_, PairRow>(
            r#"
            SELECT p.agent_id, p.user_content, p.user_at, p.agent_content, p.agent_at
            FROM conversation_pairs p
            JOIN conversation_sessions s
              ON s.user_id = p.user_id AND s.session_id = p.session_id
            WHERE p.user_id = ? AND p.session_id = ? AND p.agent_id = ?
              AND s.expires_at > ?
            ORDER BY p.id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(agent_id)
        .bind(self.clock.now_millis())
        .bind(self.cap())
        .fetch_all(&self.pool)
        .await?;

        let mut pairs = rows
            .into_iter()
            .map(PairRow::into_pair)
            .collect::<Result<Vec<_>>>()?;
        pairs.reverse();
        Ok(pairs)
    }

    async fn load_session(&self, user_id: &str, session_id: &str) -> Result<Vec<MessagePair>> {
        let rows = sqlx::query_as::<_, PairRow>(
            r#"
            SELECT p.agent_id, p.user_content, p.user_at, p.agent_content, p.agent_at
            FROM conversation_pairs p
            JOIN conversation_sessions s
              ON s.user_id = p.user_id AND s.session_id = p.session_id
            WHERE p.user_id = ? AND p.session_id = ? AND s.expires_at > ?
            ORDER BY p.id ASC
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(self.clock.now_millis())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PairRow::into_pair).collect()
    }

    async fn append(
        &self,
        user_id: &str,
        session_id: &str,
        agent_id: &str,
        pair: MessagePair,
    ) -> Result<()> {
        let now = self.clock.now_millis();
        let mut tx = self.pool.begin().await?;

        // An expired session starts over; the cascade drops its pairs.
        sqlx::query(
            r#"
            DELETE FROM conversation_sessions
            WHERE user_id = ? AND session_id = ? AND expires_at <= ?
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO conversation_sessions (user_id, session_id, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, session_id) DO UPDATE SET
                expires_at = excluded.expires_at
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(expiry_millis(now, self.policy.ttl))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO conversation_pairs
                (user_id, session_id, agent_id, user_content, user_at, agent_content, agent_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(agent_id)
        .bind(&pair.user.content)
        .bind(pair.user.timestamp.timestamp_millis())
        .bind(&pair.agent.content)
        .bind(pair.agent.timestamp.timestamp_millis())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM conversation_pairs
            WHERE user_id = ? AND session_id = ? AND agent_id = ?
              AND id NOT IN (
                SELECT id FROM conversation_pairs
                WHERE user_id = ? AND session_id = ? AND agent_id = ?
                ORDER BY id DESC
                LIMIT ?
              )
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(agent_id)
        .bind(user_id)
        .bind(session_id)
        .bind(agent_id)
        .bind(self.cap())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM conversation_sessions
            WHERE expires_at <= ?
            "#,
        )
        .bind(self.clock.now_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
