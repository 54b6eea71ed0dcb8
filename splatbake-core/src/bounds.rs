//! Axis-aligned bounds over transformed positions.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from bounds computation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoundsError {
    /// No positions to bound; there is no meaningful sentinel box.
    #[error("cannot compute bounds of an empty position array")]
    EmptyInput,
}

/// Axis-aligned bounding box in engine space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

/// Compute the bounding box of already-transformed positions.
pub fn compute_bounds(positions: &[Vec3]) -> Result<Aabb, BoundsError> {
    let first = *positions.first().ok_or(BoundsError::EmptyInput)?;
    let mut aabb = Aabb {
        min: first,
        max: first,
    };
    for position in &positions[1..] {
        aabb.min = aabb.min.min(*position);
        aabb.max = aabb.max.max(*position);
    }
    Ok(aabb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_of_scattered_points() {
        let positions = vec![
            Vec3::new(1.0, -2.0, 3.0),
            Vec3::new(-5.0, 0.0, 10.0),
            Vec3::new(2.0, 7.0, -1.0),
        ];
        let aabb = compute_bounds(&positions).unwrap();
        assert_eq!(aabb.min, Vec3::new(-5.0, -2.0, -1.0));
        assert_eq!(aabb.max, Vec3::new(2.0, 7.0, 10.0));
    }

    #[test]
    fn test_bounds_of_single_point() {
        let aabb = compute_bounds(&[Vec3::new(4.0, 5.0, 6.0)]).unwrap();
        assert_eq!(aabb.min, aabb.max);
    }

    #[test]
    fn test_bounds_of_empty_input() {
        assert_eq!(compute_bounds(&[]), Err(BoundsError::EmptyInput));
    }
}
