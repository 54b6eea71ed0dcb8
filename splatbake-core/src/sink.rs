//! The image-store seam.
//!
//! Texture persistence belongs to an external collaborator (an engine
//! asset store, the filesystem, a test harness). The pipeline only ever
//! talks to an [`ImageSink`], hands over `(name, width, height, pixels)`,
//! and keeps the returned handle.

use std::collections::HashMap;

use glam::Vec4;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from storing a packed image.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to store image {name}: {reason}")]
    Store { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable reference to a stored texture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureHandle(pub String);

impl std::fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Destination for packed RGBA32F images.
pub trait ImageSink {
    /// Store one image and return a stable handle for it.
    fn store(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        pixels: &[Vec4],
    ) -> Result<TextureHandle, SinkError>;
}

/// One image retained by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec4>,
}

/// In-memory sink for tests and in-process consumers.
#[derive(Debug, Default)]
pub struct MemorySink {
    images: HashMap<String, StoredImage>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored image by name.
    pub fn image(&self, name: &str) -> Option<&StoredImage> {
        self.images.get(name)
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageSink for MemorySink {
    fn store(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        pixels: &[Vec4],
    ) -> Result<TextureHandle, SinkError> {
        self.images.insert(
            name.to_string(),
            StoredImage {
                width,
                height,
                pixels: pixels.to_vec(),
            },
        );
        Ok(TextureHandle(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_retains_images() {
        let mut sink = MemorySink::new();
        let pixels = vec![Vec4::splat(1.5); 4];
        let handle = sink.store("positiontexture", 2, 2, &pixels).unwrap();
        assert_eq!(handle, TextureHandle("positiontexture".to_string()));

        let stored = sink.image("positiontexture").unwrap();
        assert_eq!((stored.width, stored.height), (2, 2));
        assert_eq!(stored.pixels, pixels);
    }
}
