//! Filesystem-backed image sink writing OpenEXR files.
//!
//! EXR is the one mainstream interchange format that round-trips RGBA32F
//! pixels losslessly, which the packed attribute data requires.

use std::path::PathBuf;

use glam::Vec4;
use image::Rgba32FImage;
use splatbake_core::{ImageSink, SinkError, TextureHandle};

/// Writes each stored image as `<dir>/<name>.exr`. Directory creation is
/// idempotent so concurrent frames can share a parent namespace.
pub struct ExrSink {
    dir: PathBuf,
}

impl ExrSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }
}

impl ImageSink for ExrSink {
    fn store(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        pixels: &[Vec4],
    ) -> Result<TextureHandle, SinkError> {
        let floats: &[f32] = bytemuck::cast_slice(pixels);
        let image =
            Rgba32FImage::from_raw(width, height, floats.to_vec()).ok_or_else(|| {
                SinkError::Store {
                    name: name.to_string(),
                    reason: format!("pixel buffer does not match {width}x{height}"),
                }
            })?;

        let path = self.dir.join(format!("{name}.exr"));
        image.save(&path).map_err(|e| SinkError::Store {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(TextureHandle(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exr_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ExrSink::new(dir.path()).unwrap();

        let pixels = vec![
            Vec4::new(1.5, -200.0, 0.25, 1.0),
            Vec4::new(0.0, 3.5e4, -0.5, 0.0),
        ];
        let handle = sink.store("positiontexture", 2, 1, &pixels).unwrap();
        assert!(handle.0.ends_with("positiontexture.exr"));

        let loaded = image::open(dir.path().join("positiontexture.exr"))
            .unwrap()
            .into_rgba32f();
        assert_eq!(loaded.dimensions(), (2, 1));
        let raw: &[f32] = loaded.as_raw();
        let expected: &[f32] = bytemuck::cast_slice(&pixels);
        for (a, b) in raw.iter().zip(expected) {
            assert!((a - b).abs() < 1e-5, "{a} != {b}");
        }
    }

    #[test]
    fn test_sink_reuses_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("frames");
        ExrSink::new(&nested).unwrap();
        // Second creation over the same path must not error.
        ExrSink::new(&nested).unwrap();
    }
}
