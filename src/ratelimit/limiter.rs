//! In-process fixed window limiter.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Decision, RateLimiter, RateWindow};

const DEFAULT_SHARDS: usize = 16;

/// Fixed window limiter keeping one [`RateWindow`] per client.
///
/// Clients are spread over mutex-guarded shards; the read-modify-write of a
/// client's counter happens under its shard lock, which serializes
/// concurrent requests from that client.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    limit: u32,
    window: Duration,
    shards: Vec<Mutex<HashMap<String, RateWindow>>>,
}

impl FixedWindowLimiter {
    /// Admits up to `limit` requests per client in every `window`.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::with_shards(limit, window, DEFAULT_SHARDS)
    }

    pub fn with_shards(limit: u32, window: Duration, shards: usize) -> Self {
        Self {
            limit,
            window,
            shards: (0..shards.max(1))
                .map(|_| Mutex::new(HashMap::new()))
                .collect(),
        }
    }

    fn shard_for(&self, client_id: &str) -> &Mutex<HashMap<String, RateWindow>> {
        let mut hasher = DefaultHasher::new();
        client_id.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn allow(&self, client_id: &str) -> Decision {
        let now = Instant::now();
        let mut windows = self.shard_for(client_id).lock().await;
        let window = windows
            .entry(client_id.to_string())
            .or_insert_with(|| RateWindow::opened_at(now));
        let decision = window.record(now, self.limit, self.window);

        if !decision.permitted {
            debug!(
                "Rate limit exceeded for client {} ({} requests in window)",
                client_id, window.count
            );
        }
        decision
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        for shard in &self.shards {
            let mut windows = shard.lock().await;
            let before = windows.len();
            windows.retain(|_, w| !w.has_elapsed(now, self.window));
            removed += before - windows.len();
        }
        removed
    }

    async fn tracked_clients(&self) -> usize {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.lock().await.len();
        }
        total
    }
}
