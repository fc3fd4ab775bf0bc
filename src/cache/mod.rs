//! Cache Module
//!
//! Artifact caching with TTL expiration and LRU eviction, behind the
//! [`ArtifactStore`] interface.

mod backend;
mod entry;
mod lru;
mod memory;
mod stats;
mod store;


// Re-export public types
pub use backend::ArtifactStore;
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use memory::MemoryArtifactStore;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed artifact size in bytes
pub const MAX_ARTIFACT_SIZE: usize = 32 * 1024 * 1024; // 32 MiB
