//! Fingerprinting
//!
//! Derives the content-addressed cache key for a resize request. The digest
//! covers the whole source payload plus both target dimensions, so two keys
//! are equal only when the bytes and the dimensions are.

use std::fmt;

use sha2::{Digest, Sha256};

/// Hex length of a SHA-256 digest.
pub const KEY_LENGTH: usize = 64;

/// Opaque, fixed-length cache key: 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// SHA-256 fingerprint of `(source_image, width, height)`.
///
/// Dimensions are appended as fixed-width little-endian integers after the
/// payload, so the encoding is unambiguous for any payload length.
pub fn fingerprint(source_image: &[u8], width: u32, height: u32) -> CacheKey {
    let mut hasher = Sha256::new();
    hasher.update(b"resize\0");
    hasher.update(source_image);
    hasher.update(width.to_le_bytes());
    hasher.update(height.to_le_bytes());
    CacheKey(format!("{:x}", hasher.finalize()))
}
