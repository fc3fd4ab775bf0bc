//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

use crate::imaging::Artifact;

// == Cache Entry ==
/// A stored artifact with its creation time and lifetime.
///
/// Entries are never mutated after creation; replacing a key installs a new
/// entry. Times are monotonic, so wall clock adjustments never revive or
/// prematurely expire an entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored artifact
    pub value: Artifact,
    /// Creation instant
    pub created_at: Instant,
    /// Lifetime, None = no expiration
    pub ttl: Option<Duration>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current instant.
    pub fn new(value: Artifact, ttl: Option<Duration>) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    /// Expiration instant, if any.
    ///
    /// A lifetime too long to represent never expires.
    pub fn expires_at(&self) -> Option<Instant> {
        self.ttl.and_then(|ttl| self.created_at.checked_add(ttl))
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once `now >= created_at + ttl`, so it stops being
    /// served the instant its lifetime has fully elapsed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at() {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL, or None if no expiration is set.
    ///
    /// Returns `Some(Duration::ZERO)` once expired.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at()
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}
