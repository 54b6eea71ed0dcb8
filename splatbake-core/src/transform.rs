//! Conversion from raw vertex columns to engine-space splat attributes.
//!
//! The numeric transforms here are the wire contract with the playback
//! material: axis remap plus ×100 unit scale for positions, exponential
//! decode for scales, quaternion normalization with the same axis remap,
//! and sigmoid decode for opacity.

use glam::{Vec3, Vec4};
use splatbake_ply::VertexColumns;
use thiserror::Error;
use tracing::debug;

use crate::types::{HarmonicBands, SplatCloud, SplatData};

/// 0th-order spherical-harmonics basis constant.
pub const SH_C0: f32 = 0.28209479177387814;

/// Quaternion lengths below this normalize to identity.
const QUAT_TOLERANCE: f32 = 1e-8;

/// A required semantic property group is absent from the source file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttributeError {
    #[error("missing required property group: {0}")]
    MissingRequiredGroup(&'static str),
}

const POSITION: [&str; 3] = ["x", "y", "z"];
const ROTATION: [&str; 4] = ["rot_0", "rot_1", "rot_2", "rot_3"];
const SCALE: [&str; 3] = ["scale_0", "scale_1", "scale_2"];
const OPACITY: [&str; 1] = ["opacity"];
const BASE_COLOR: [&str; 3] = ["f_dc_0", "f_dc_1", "f_dc_2"];
const NORMAL: [&str; 3] = ["nx", "ny", "nz"];

fn group_present(columns: &VertexColumns, names: &[&str]) -> bool {
    names.iter().all(|name| columns.contains(name))
}

fn harmonics_present(columns: &VertexColumns) -> bool {
    (0..HarmonicBands::SCALARS).all(|i| columns.contains(&format!("f_rest_{i}")))
}

fn require<'a>(
    columns: &'a VertexColumns,
    names: &[&str],
    group: &'static str,
) -> Result<Vec<&'a [f64]>, AttributeError> {
    names
        .iter()
        .map(|name| {
            columns
                .column(name)
                .ok_or(AttributeError::MissingRequiredGroup(group))
        })
        .collect()
}

/// `1 / (1 + e^-v)`, the inverse of the logit opacity encoding.
fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

/// Convert a 0th-order SH coefficient vector to RGB.
///
/// Used by non-texture consumers only; the packing path stores the raw
/// coefficients and leaves the conversion to the material.
pub fn sh0_to_rgb(value: Vec3) -> Vec3 {
    Vec3::splat(0.5) + SH_C0 * value
}

/// Position remap: right-handed source to engine axes, ×100 unit scale.
fn remap_position(x: f32, y: f32, z: f32) -> Vec3 {
    100.0 * Vec3::new(x, -z, -y)
}

/// Scale decode: exponential (log-scale storage) with the same Y/Z swap
/// as positions, ×100.
fn remap_scale(s0: f32, s1: f32, s2: f32) -> Vec3 {
    100.0 * Vec3::new(s0.exp(), s2.exp(), s1.exp())
}

/// Rotation decode: quaternion with scalar part `rot_0` and vector part
/// `(rot_1, rot_2, rot_3)`, normalized, then remapped to `(x, -z, -y, w)`.
fn remap_rotation(r0: f32, r1: f32, r2: f32, r3: f32) -> Vec4 {
    let q = Vec4::new(r1, r2, r3, r0);
    let len = q.length();
    let q = if len > QUAT_TOLERANCE {
        q / len
    } else {
        Vec4::new(0.0, 0.0, 0.0, 1.0)
    };
    Vec4::new(q.x, -q.z, -q.y, q.w)
}

fn decode_opacity(v: f32) -> f32 {
    sigmoid(v).clamp(0.0, 1.0)
}

/// Collect the 15 three-scalar harmonic groups for point `i`.
fn harmonic_groups(rest: &[&[f64]], i: usize) -> impl Iterator<Item = Vec3> {
    (0..HarmonicBands::SCALARS).step_by(3).map(move |y| {
        Vec3::new(
            rest[y][i] as f32,
            rest[y + 1][i] as f32,
            rest[y + 2][i] as f32,
        )
    })
}

/// Transform raw columns into the attribute arrays the texture packer
/// consumes.
///
/// Position, rotation, scale, opacity, and base color are each
/// all-or-nothing required groups; any absence fails the whole file with
/// no partial output. The 45 higher-order harmonics are optional as a
/// block: when absent, the band arrays are simply omitted.
pub fn transform_columns(columns: &VertexColumns) -> Result<SplatCloud, AttributeError> {
    let n = columns.rows();

    let position = require(columns, &POSITION, "position")?;
    let rotation = require(columns, &ROTATION, "rotation")?;
    let scale = require(columns, &SCALE, "scale")?;
    let opacity = require(columns, &OPACITY, "opacity")?;
    let base_color = require(columns, &BASE_COLOR, "base color")?;

    let rest_columns: Option<Vec<&[f64]>> = if harmonics_present(columns) {
        let rest = (0..HarmonicBands::SCALARS)
            .map(|i| columns.column(&format!("f_rest_{i}")).unwrap())
            .collect();
        Some(rest)
    } else {
        None
    };

    let mut cloud = SplatCloud {
        positions: Vec::with_capacity(n),
        scales: Vec::with_capacity(n),
        rotations: Vec::with_capacity(n),
        opacities: Vec::with_capacity(n),
        base_colors: Vec::with_capacity(n),
        harmonics: rest_columns.as_ref().map(|_| HarmonicBands::default()),
    };

    for i in 0..n {
        cloud.positions.push(remap_position(
            position[0][i] as f32,
            position[1][i] as f32,
            position[2][i] as f32,
        ));
        cloud.scales.push(remap_scale(
            scale[0][i] as f32,
            scale[1][i] as f32,
            scale[2][i] as f32,
        ));
        cloud.rotations.push(remap_rotation(
            rotation[0][i] as f32,
            rotation[1][i] as f32,
            rotation[2][i] as f32,
            rotation[3][i] as f32,
        ));
        cloud.opacities.push(decode_opacity(opacity[0][i] as f32));
        cloud.base_colors.push(Vec3::new(
            base_color[0][i] as f32,
            base_color[1][i] as f32,
            base_color[2][i] as f32,
        ));

        if let (Some(rest), Some(bands)) = (&rest_columns, cloud.harmonics.as_mut()) {
            let (l1, l2, l31, _) = HarmonicBands::GROUPS;
            for (group, value) in harmonic_groups(rest, i).enumerate() {
                if group < l1 {
                    bands.l1.push(value);
                } else if group < l1 + l2 {
                    bands.l2.push(value);
                } else if group < l1 + l2 + l31 {
                    bands.l31.push(value);
                } else {
                    bands.l32.push(value);
                }
            }
        }
    }

    debug!(
        points = n,
        harmonics = cloud.harmonics.is_some(),
        "transformed splat attributes"
    );

    Ok(cloud)
}

/// Leniently collect splat data for non-texture consumers.
///
/// Each semantic group is emitted only if its columns are present; nothing
/// is required. Normals pass through untransformed; all other groups use
/// the same numeric transforms as [`transform_columns`].
pub fn collect_splats(columns: &VertexColumns) -> SplatData {
    let n = columns.rows();
    let mut data = SplatData::default();

    if let Ok(position) = require(columns, &POSITION, "position") {
        data.positions = (0..n)
            .map(|i| {
                remap_position(
                    position[0][i] as f32,
                    position[1][i] as f32,
                    position[2][i] as f32,
                )
            })
            .collect();
    }
    if let Ok(normal) = require(columns, &NORMAL, "normal") {
        data.normals = (0..n)
            .map(|i| Vec3::new(normal[0][i] as f32, normal[1][i] as f32, normal[2][i] as f32))
            .collect();
    }
    if let Ok(rotation) = require(columns, &ROTATION, "rotation") {
        data.orientations = (0..n)
            .map(|i| {
                remap_rotation(
                    rotation[0][i] as f32,
                    rotation[1][i] as f32,
                    rotation[2][i] as f32,
                    rotation[3][i] as f32,
                )
            })
            .collect();
    }
    if let Ok(scale) = require(columns, &SCALE, "scale") {
        data.scales = (0..n)
            .map(|i| remap_scale(scale[0][i] as f32, scale[1][i] as f32, scale[2][i] as f32))
            .collect();
    }
    if let Ok(opacity) = require(columns, &OPACITY, "opacity") {
        data.opacities = (0..n).map(|i| decode_opacity(opacity[0][i] as f32)).collect();
    }
    if let Ok(base_color) = require(columns, &BASE_COLOR, "base color") {
        data.sh0 = (0..n)
            .map(|i| {
                Vec3::new(
                    base_color[0][i] as f32,
                    base_color[1][i] as f32,
                    base_color[2][i] as f32,
                )
            })
            .collect();
    }
    if harmonics_present(columns) {
        let rest: Vec<&[f64]> = (0..HarmonicBands::SCALARS)
            .map(|i| columns.column(&format!("f_rest_{i}")).unwrap())
            .collect();
        data.sh_rest = (0..n).map(|i| harmonic_groups(&rest, i).collect()).collect();
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn columns_for(points: &[TestPoint], with_harmonics: bool) -> VertexColumns {
        let mut map: HashMap<String, Vec<f64>> = HashMap::new();
        let mut push = |name: &str, f: &dyn Fn(&TestPoint) -> f64| {
            map.insert(name.to_string(), points.iter().map(f).collect());
        };

        push("x", &|p| p.position[0]);
        push("y", &|p| p.position[1]);
        push("z", &|p| p.position[2]);
        for (i, name) in ["rot_0", "rot_1", "rot_2", "rot_3"].iter().enumerate() {
            push(name, &move |p| p.rotation[i]);
        }
        for (i, name) in ["scale_0", "scale_1", "scale_2"].iter().enumerate() {
            push(name, &move |p| p.scale[i]);
        }
        push("opacity", &|p| p.opacity);
        for (i, name) in ["f_dc_0", "f_dc_1", "f_dc_2"].iter().enumerate() {
            push(name, &move |p| p.color[i]);
        }
        if with_harmonics {
            for i in 0..HarmonicBands::SCALARS {
                push(&format!("f_rest_{i}"), &move |p| p.rest[i]);
            }
        }
        VertexColumns::from_columns(map)
    }

    struct TestPoint {
        position: [f64; 3],
        rotation: [f64; 4],
        scale: [f64; 3],
        opacity: f64,
        color: [f64; 3],
        rest: [f64; 45],
    }

    fn sample_point() -> TestPoint {
        let mut rest = [0.0; 45];
        for (i, v) in rest.iter_mut().enumerate() {
            *v = i as f64 * 0.25;
        }
        TestPoint {
            position: [1.0, 2.0, 3.0],
            rotation: [2.0, 0.0, 0.0, 0.0],
            scale: [0.0, 1.0, -1.0],
            opacity: 0.0,
            color: [0.25, 0.5, 0.75],
            rest,
        }
    }

    #[test]
    fn test_position_axis_remap_and_scale() {
        let cloud = transform_columns(&columns_for(&[sample_point()], false)).unwrap();
        assert_eq!(cloud.positions[0], Vec3::new(100.0, -300.0, -200.0));
    }

    #[test]
    fn test_scale_exp_decode_with_axis_swap() {
        let cloud = transform_columns(&columns_for(&[sample_point()], false)).unwrap();
        let expected = 100.0
            * Vec3::new(
                0.0f32.exp(),
                (-1.0f32).exp(), // scale_2 lands in Y
                1.0f32.exp(),    // scale_1 lands in Z
            );
        let diff = (cloud.scales[0] - expected).abs();
        assert!(diff.max_element() < 1e-4, "got {:?}", cloud.scales[0]);
    }

    #[test]
    fn test_rotation_normalized_and_remapped() {
        // Scalar part 2.0, vector zero: normalizes to identity (w = 1).
        let cloud = transform_columns(&columns_for(&[sample_point()], false)).unwrap();
        assert_eq!(cloud.rotations[0], Vec4::new(0.0, 0.0, 0.0, 1.0));

        let mut p = sample_point();
        p.rotation = [1.0, 0.0, 3.0, 0.0]; // w=1, vector (0, 3, 0)
        let cloud = transform_columns(&columns_for(&[p], false)).unwrap();
        let q = cloud.rotations[0];
        // Input y-component lands negated in the z slot.
        assert!(q.x.abs() < 1e-6);
        assert!(q.y.abs() < 1e-6);
        assert!((q.z + 3.0 / 10.0f32.sqrt()).abs() < 1e-5);
        assert!((q.w - 1.0 / 10.0f32.sqrt()).abs() < 1e-5);
        assert!((q.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_rotation_unit_norm_for_arbitrary_inputs() {
        for rotation in [
            [0.3, -0.9, 2.4, 0.01],
            [-5.0, 5.0, -5.0, 5.0],
            [1e-3, 0.0, 0.0, 1e-3],
        ] {
            let mut p = sample_point();
            p.rotation = rotation;
            let cloud = transform_columns(&columns_for(&[p], false)).unwrap();
            assert!((cloud.rotations[0].length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_opacity_sigmoid_bounds() {
        for (raw, expected) in [(0.0, 0.5), (1e3, 1.0), (-1e3, 0.0)] {
            let mut p = sample_point();
            p.opacity = raw;
            let cloud = transform_columns(&columns_for(&[p], false)).unwrap();
            let opacity = cloud.opacities[0];
            assert!((0.0..=1.0).contains(&opacity));
            assert!((opacity - expected as f32).abs() < 1e-6);
        }
    }

    #[test]
    fn test_base_color_pass_through() {
        let cloud = transform_columns(&columns_for(&[sample_point()], false)).unwrap();
        assert_eq!(cloud.base_colors[0], Vec3::new(0.25, 0.5, 0.75));
    }

    #[test]
    fn test_harmonic_partition_3_5_4_3() {
        let cloud = transform_columns(&columns_for(&[sample_point()], true)).unwrap();
        let bands = cloud.harmonics.unwrap();
        assert_eq!(bands.l1.len(), 3);
        assert_eq!(bands.l2.len(), 5);
        assert_eq!(bands.l31.len(), 4);
        assert_eq!(bands.l32.len(), 3);

        // Groups are sequential 3-scalar windows; nothing dropped or
        // duplicated across the split.
        let all: Vec<Vec3> = bands
            .l1
            .iter()
            .chain(&bands.l2)
            .chain(&bands.l31)
            .chain(&bands.l32)
            .copied()
            .collect();
        for (group, value) in all.iter().enumerate() {
            let base = group as f32 * 3.0 * 0.25;
            assert_eq!(*value, Vec3::new(base, base + 0.25, base + 0.5));
        }
    }

    #[test]
    fn test_harmonics_absent_is_not_fatal() {
        let cloud = transform_columns(&columns_for(&[sample_point()], false)).unwrap();
        assert!(cloud.harmonics.is_none());
    }

    #[test]
    fn test_missing_required_group_fails_whole_file() {
        let mut map = HashMap::new();
        map.insert("x".to_string(), vec![1.0]);
        map.insert("y".to_string(), vec![1.0]);
        map.insert("z".to_string(), vec![1.0]);
        let columns = VertexColumns::from_columns(map);
        assert_eq!(
            transform_columns(&columns),
            Err(AttributeError::MissingRequiredGroup("rotation"))
        );
    }

    #[test]
    fn test_sh0_to_rgb() {
        let rgb = sh0_to_rgb(Vec3::ZERO);
        assert_eq!(rgb, Vec3::splat(0.5));
        let rgb = sh0_to_rgb(Vec3::new(1.0, 0.0, -1.0));
        assert!((rgb.x - (0.5 + SH_C0)).abs() < 1e-7);
        assert!((rgb.z - (0.5 - SH_C0)).abs() < 1e-7);
    }

    #[test]
    fn test_lenient_collect_with_partial_groups() {
        let mut map = HashMap::new();
        map.insert("x".to_string(), vec![1.0]);
        map.insert("y".to_string(), vec![2.0]);
        map.insert("z".to_string(), vec![3.0]);
        map.insert("nx".to_string(), vec![0.0]);
        map.insert("ny".to_string(), vec![1.0]);
        map.insert("nz".to_string(), vec![0.0]);
        let columns = VertexColumns::from_columns(map);

        let data = collect_splats(&columns);
        assert_eq!(data.positions, vec![Vec3::new(100.0, -300.0, -200.0)]);
        assert_eq!(data.normals, vec![Vec3::new(0.0, 1.0, 0.0)]);
        assert!(data.orientations.is_empty());
        assert!(data.opacities.is_empty());
        assert!(data.sh_rest.is_empty());
    }
}
