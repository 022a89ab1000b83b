//! Background removal of expired sessions.
//!
//! Expiry is enforced lazily on read; the reaper only reclaims space.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::ConversationStore;

/// Spawn a task that calls [`ConversationStore::purge_expired`] every `every`.
///
/// Intervals below one second are raised to one second. Abort the returned
/// handle to stop the reaper.
pub fn spawn_reaper(store: Arc<dyn ConversationStore>, every: Duration) -> JoinHandle<()> {
    let every = every.max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(store = store.name(), interval_secs = every.as_secs(), "Session reaper started");

        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => debug!("Reaper: nothing to purge"),
                Ok(removed) => info!(removed, "Reaper purged expired sessions"),
                Err(e) => warn!(error = %e, "Reaper failed to purge expired sessions"),
            }
        }
    })
}
