//! Near-square row-major texture packing.
//!
//! Each attribute group packs independently into its own RGBA32F buffer;
//! harmonic bands generally have different pixel counts than the primary
//! attributes because of the 3/5/4/3 grouping.

use glam::Vec4;
use thiserror::Error;

/// Minimum primary point count for a viable bake; at or below this the
/// model is rejected before any texture is produced.
pub const MIN_POINT_COUNT: usize = 100;

/// Errors from texture packing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackError {
    #[error("too few splats to process: {count} (need more than {MIN_POINT_COUNT})")]
    TooFewPoints { count: usize },
}

/// A packed 4-channel float image buffer, `pixels.len() == width * height`.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec4>,
}

impl PackedTexture {
    /// Row-major read-back of pixel `i`.
    pub fn texel(&self, i: usize) -> Vec4 {
        self.pixels[i]
    }
}

/// Reject degenerate point counts before packing begins.
pub fn check_point_count(count: usize) -> Result<(), PackError> {
    if count <= MIN_POINT_COUNT {
        return Err(PackError::TooFewPoints { count });
    }
    Ok(())
}

/// Near-square extent for `count` pixels: `width = ceil(sqrt(count))`,
/// `height = ceil(count / width)`.
pub fn texture_extent(count: usize) -> (u32, u32) {
    let width = (count as f64).sqrt().ceil();
    let height = (count as f64 / width).ceil();
    (width as u32, height as u32)
}

/// Serialize values row-major into a near-square RGBA32F buffer starting
/// at pixel 0. Pixels beyond `values.len()` are zero-filled so the output
/// is deterministic.
pub fn pack(values: &[Vec4]) -> PackedTexture {
    let (width, height) = texture_extent(values.len());
    let mut pixels = Vec::with_capacity((width * height) as usize);
    pixels.extend_from_slice(values);
    pixels.resize((width * height) as usize, Vec4::ZERO);

    PackedTexture {
        width,
        height,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_is_near_square() {
        assert_eq!(texture_extent(1), (1, 1));
        assert_eq!(texture_extent(4), (2, 2));
        assert_eq!(texture_extent(5), (3, 2));
        assert_eq!(texture_extent(101), (11, 10));
        assert_eq!(texture_extent(10_000), (100, 100));
    }

    #[test]
    fn test_extent_covers_count() {
        for count in [1usize, 2, 3, 101, 333, 4097, 123_456] {
            let (w, h) = texture_extent(count);
            assert!((w as usize) * (h as usize) >= count, "count {count}");
        }
    }

    #[test]
    fn test_pack_round_trip() {
        let values: Vec<Vec4> = (0..301)
            .map(|i| {
                let f = i as f32;
                Vec4::new(f, -f * 0.5, f * 2.0, 1.0 - f)
            })
            .collect();
        let texture = pack(&values);
        assert_eq!(
            (texture.width * texture.height) as usize,
            texture.pixels.len()
        );
        for (i, value) in values.iter().enumerate() {
            let diff = (texture.texel(i) - *value).abs();
            assert!(diff.max_element() < 1e-5);
        }
    }

    #[test]
    fn test_pack_zero_fills_padding() {
        let values = vec![Vec4::ONE; 5];
        let texture = pack(&values);
        assert_eq!((texture.width, texture.height), (3, 2));
        for i in 5..texture.pixels.len() {
            assert_eq!(texture.texel(i), Vec4::ZERO);
        }
    }

    #[test]
    fn test_point_count_guard() {
        assert_eq!(
            check_point_count(100),
            Err(PackError::TooFewPoints { count: 100 })
        );
        assert_eq!(
            check_point_count(0),
            Err(PackError::TooFewPoints { count: 0 })
        );
        assert!(check_point_count(101).is_ok());
    }
}
