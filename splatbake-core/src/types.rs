//! CPU-side splat attribute arrays.
//!
//! Attributes are stored as one array per semantic group rather than one
//! struct per point, since every consumer (bounds, packing) walks a single
//! group at a time.

use glam::{Vec3, Vec4};

/// Higher-order spherical-harmonics coefficients, grouped into the four
/// band textures the renderer samples.
///
/// The 45 `f_rest_*` scalars per point are reinterpreted as 15 sequential
/// 3-scalar groups and partitioned 3/5/4/3. The split is a fixed protocol
/// contract with the playback material, not derived from data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarmonicBands {
    /// Band L1: groups 0..2, three values per point.
    pub l1: Vec<Vec3>,
    /// Band L2: groups 3..7, five values per point.
    pub l2: Vec<Vec3>,
    /// Band L3 (first part): groups 8..11, four values per point.
    pub l31: Vec<Vec3>,
    /// Band L3 (second part): groups 12..14, three values per point.
    pub l32: Vec<Vec3>,
}

impl HarmonicBands {
    /// Groups per point in each band, in (l1, l2, l31, l32) order.
    pub const GROUPS: (usize, usize, usize, usize) = (3, 5, 4, 3);

    /// Total `f_rest_*` scalars per point.
    pub const SCALARS: usize = 45;
}

/// Fully transformed splat attributes for the texture-baking path.
///
/// All arrays have identical length; `harmonics` is present only when the
/// source file carried all 45 higher-order coefficients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplatCloud {
    /// Engine-space positions (axis-remapped, ×100).
    pub positions: Vec<Vec3>,
    /// Engine-space scales (exp-decoded, axis-swapped, ×100).
    pub scales: Vec<Vec3>,
    /// Unit quaternions as (x, y, z, w) after axis remap.
    pub rotations: Vec<Vec4>,
    /// Sigmoid-decoded opacity in [0, 1].
    pub opacities: Vec<f32>,
    /// 0th-order SH coefficients, passed through unconverted.
    pub base_colors: Vec<Vec3>,
    /// Higher-order SH bands, when present in the source.
    pub harmonics: Option<HarmonicBands>,
}

impl SplatCloud {
    /// Number of splats.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Leniently parsed splat data for non-texture consumers.
///
/// Unlike [`SplatCloud`], every group is independent: a group absent from
/// the source file simply yields an empty array, and optional normals are
/// carried through untransformed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplatData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub orientations: Vec<Vec4>,
    pub scales: Vec<Vec3>,
    pub opacities: Vec<f32>,
    /// 0th-order SH coefficients (f_dc_0..2).
    pub sh0: Vec<Vec3>,
    /// Higher-order SH coefficients: 15 three-scalar groups per point.
    pub sh_rest: Vec<Vec<Vec3>>,
}
