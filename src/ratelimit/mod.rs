//! Rate Limiting Module
//!
//! Per-client request budgets over fixed time windows, behind the
//! [`RateLimiter`] interface.

mod limiter;
mod window;

pub use limiter::FixedWindowLimiter;
pub use window::RateWindow;

use std::time::Duration;

use async_trait::async_trait;

/// Client bucket shared by every caller without a usable network identity.
pub const UNKNOWN_CLIENT: &str = "unknown";

// == Decision ==
/// Outcome of a rate limit check. Denial is a normal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub permitted: bool,
    /// Time until the client's window rolls over, set on denial
    pub retry_after: Option<Duration>,
}

impl Decision {
    pub fn permit() -> Self {
        Self {
            permitted: true,
            retry_after: None,
        }
    }

    pub fn deny(retry_after: Duration) -> Self {
        Self {
            permitted: false,
            retry_after: Some(retry_after),
        }
    }
}

// == Rate Limiter ==
/// Admits or denies requests per client identity.
///
/// Decisions for one client must be consistent with a total order of
/// arrival: two concurrent calls never both take the last slot.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn allow(&self, client_id: &str) -> Decision;

    /// Forgets windows that have fully elapsed, returning how many.
    async fn purge_expired(&self) -> usize {
        0
    }

    /// Number of clients currently tracked.
    async fn tracked_clients(&self) -> usize {
        0
    }
}
