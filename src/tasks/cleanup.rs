//! Expiry Sweep Task
//!
//! Background task that periodically drops expired artifacts and elapsed
//! rate limit windows. Reads already treat expired state as absent; the
//! sweep reclaims the memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ArtifactStore;
use crate::ratelimit::RateLimiter;

/// Spawns a background task that purges expired cache entries and rate
/// limit windows every `cleanup_interval_secs` seconds.
///
/// Returns the task's JoinHandle so it can be aborted during graceful
/// shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(gateway.cache().clone(), gateway.limiter().clone(), 30);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(
    cache: Arc<dyn ArtifactStore>,
    limiter: Arc<dyn RateLimiter>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let artifacts = cache.purge_expired().await;
            let windows = limiter.purge_expired().await;

            if artifacts > 0 || windows > 0 {
                info!(
                    "Expiry sweep: removed {} artifacts and {} rate limit windows",
                    artifacts, windows
                );
            } else {
                debug!("Expiry sweep: nothing expired");
            }
        }
    })
}
