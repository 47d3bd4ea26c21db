//! Periodic Cleanup Task
//!
//! Background task that purges expired cached responses and forgets rate
//! limiter state for idle clients.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::ClientRateLimiter;
use crate::cache::ResponseCache;

/// Spawns the cleanup loop, running every `cleanup_interval_secs` (at least
/// one second).
///
/// The returned handle is aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(state.cache.clone(), state.limiter.clone(), 60);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(
    cache: Arc<dyn ResponseCache>,
    limiter: Arc<ClientRateLimiter>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired().await;
            limiter.retain_recent();

            if removed > 0 {
                info!(removed, "Cleanup: purged expired cache entries");
            } else {
                debug!("Cleanup: no expired entries found");
            }
            debug!(
                tracked_clients = limiter.tracked_clients(),
                "Cleanup: rate limiter state pruned"
            );
        }
    })
}
