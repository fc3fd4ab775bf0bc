//! Fixed window state for a single client.

use std::time::{Duration, Instant};

use super::Decision;

/// Request count within the window that started at `window_start`.
///
/// A client with no window is idle; the first request creates one.
#[derive(Debug, Clone, Copy)]
pub struct RateWindow {
    pub count: u32,
    pub window_start: Instant,
}

impl RateWindow {
    /// Opens an empty window at `now`, for a client seen for the first time.
    pub fn opened_at(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    /// Opens a window at `now` holding its first request.
    pub fn start(now: Instant) -> Self {
        Self {
            count: 1,
            window_start: now,
        }
    }

    pub fn has_elapsed(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }

    /// Records one request at `now` and decides whether it is admitted.
    ///
    /// A window that has run its full length resets to a fresh one holding
    /// this request. Otherwise the count grows and the request is admitted
    /// while the count stays within `limit`.
    pub fn record(&mut self, now: Instant, limit: u32, window: Duration) -> Decision {
        if self.has_elapsed(now, window) {
            *self = Self::start(now);
        } else {
            self.count = self.count.saturating_add(1);
        }

        if self.count <= limit {
            Decision::permit()
        } else {
            let elapsed = now.saturating_duration_since(self.window_start);
            Decision::deny(window.saturating_sub(elapsed))
        }
    }
}
