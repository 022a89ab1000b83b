//! Application state shared across handlers.

use std::sync::Arc;

use chat_storage::{
    Clock, ConversationStore, MemoryStore, RetentionPolicy, SqliteStore, StorageError,
};
use orchestrator::Orchestrator;
use tracing::info;

use crate::config::StorageBackend;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The router every request goes through.
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create new application state.
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Open the configured conversation store.
pub async fn open_store(
    backend: &StorageBackend,
    policy: RetentionPolicy,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn ConversationStore>, StorageError> {
    let store: Arc<dyn ConversationStore> = match backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new(policy, clock)),
        StorageBackend::Sqlite(url) => Arc::new(SqliteStore::connect(url, policy, clock).await?),
    };
    info!(store = store.name(), "Conversation store ready");
    Ok(store)
}
