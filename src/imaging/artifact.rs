//! Artifact Module
//!
//! The immutable, encoded output of a resize.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Encodings the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Png,
    Jpeg,
}

impl ArtifactFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ArtifactFormat::Png => "image/png",
            ArtifactFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactFormat::Png => "png",
            ArtifactFormat::Jpeg => "jpeg",
        }
    }
}

/// An encoded image plus the metadata needed to serve it.
///
/// The byte buffer is shared and never mutated, so clones are cheap and a
/// reader holding one always sees the complete payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    bytes: Arc<[u8]>,
    format: ArtifactFormat,
    width: u32,
    height: u32,
}

impl Artifact {
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        format: ArtifactFormat,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            format,
            width,
            height,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ArtifactFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Renders the artifact as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url() {
        let artifact = Artifact::new(vec![1u8, 2, 3], ArtifactFormat::Png, 1, 1);
        assert_eq!(artifact.to_data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn test_clone_shares_buffer() {
        let artifact = Artifact::new(vec![9u8; 16], ArtifactFormat::Jpeg, 4, 4);
        let copy = artifact.clone();
        assert!(std::ptr::eq(artifact.bytes().as_ptr(), copy.bytes().as_ptr()));
        assert_eq!(copy.format().mime_type(), "image/jpeg");
    }
}
