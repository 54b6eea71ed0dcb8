//! Single-file bake driver: bytes → columns → attributes → textures.

use std::path::Path;

use glam::Vec4;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::bounds::{Aabb, BoundsError, compute_bounds};
use crate::pack::{PackError, check_point_count, pack};
use crate::sink::{ImageSink, SinkError, TextureHandle};
use crate::transform::{AttributeError, collect_splats, transform_columns};
use crate::types::{SplatCloud, SplatData};
use splatbake_ply::ParseError;

/// Texture names in the output set. The playback consumer looks these up
/// verbatim, so they are part of the wire contract.
pub const POSITION_TEXTURE: &str = "positiontexture";
pub const COLOR_TEXTURE: &str = "colortexture";
pub const SCALE_TEXTURE: &str = "scaletexture";
pub const ROTATION_TEXTURE: &str = "rotationtexture";
pub const HARMONICS_L1_TEXTURE: &str = "harmonicsl1texture";
pub const HARMONICS_L2_TEXTURE: &str = "harmonicsl2texture";
pub const HARMONICS_L31_TEXTURE: &str = "harmonicsl31texture";
pub const HARMONICS_L32_TEXTURE: &str = "harmonicsl32texture";

/// Errors from the single-file pipeline. Each stage's error passes
/// through unchanged so the root cause is never lost.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error(transparent)]
    Bounds(#[from] BoundsError),

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Result of baking one PLY file.
#[derive(Debug, Clone, Serialize)]
pub struct FrameBake {
    /// Vertex rows in the source file.
    pub vertex_count: usize,
    /// Bounds of the transformed positions.
    pub bounds: Aabb,
    /// `(texture name, sink handle)` per stored texture.
    pub textures: Vec<(String, TextureHandle)>,
}

/// Bake a single PLY file into its texture set through `sink`.
pub fn bake_file(path: &Path, sink: &mut dyn ImageSink) -> Result<FrameBake, PipelineError> {
    info!(path = %path.display(), "baking splat model");
    let bytes = std::fs::read(path)?;
    bake_bytes(&bytes, sink)
}

/// Bake an in-memory PLY byte buffer into its texture set through `sink`.
pub fn bake_bytes(bytes: &[u8], sink: &mut dyn ImageSink) -> Result<FrameBake, PipelineError> {
    let (header, columns) = splatbake_ply::parse(bytes)?;
    debug!(header = %header, "source header");

    let cloud = transform_columns(&columns)?;
    check_point_count(cloud.len())?;
    let bounds = compute_bounds(&cloud.positions)?;

    let mut textures = Vec::new();
    for (name, pixels) in texture_groups(&cloud) {
        let texture = pack(&pixels);
        let handle = sink.store(name, texture.width, texture.height, &texture.pixels)?;
        debug!(
            texture = name,
            width = texture.width,
            height = texture.height,
            "stored texture"
        );
        textures.push((name.to_string(), handle));
    }

    info!(
        vertices = cloud.len(),
        textures = textures.len(),
        "baked splat model"
    );

    Ok(FrameBake {
        vertex_count: cloud.len(),
        bounds,
        textures,
    })
}

/// Leniently parse an in-memory PLY buffer into per-group splat arrays,
/// without the texture path's required-group or point-count rules.
pub fn parse_splats(bytes: &[u8]) -> Result<SplatData, PipelineError> {
    let (_, columns) = splatbake_ply::parse(bytes)?;
    Ok(collect_splats(&columns))
}

/// Assemble the per-group pixel arrays. Position and scale are 3-wide and
/// pack with an unused 4th channel; color carries opacity in its 4th
/// channel; rotation is naturally 4-wide.
fn texture_groups(cloud: &SplatCloud) -> Vec<(&'static str, Vec<Vec4>)> {
    let mut groups = vec![
        (
            POSITION_TEXTURE,
            cloud.positions.iter().map(|p| p.extend(0.0)).collect(),
        ),
        (
            COLOR_TEXTURE,
            cloud
                .base_colors
                .iter()
                .zip(&cloud.opacities)
                .map(|(c, a)| Vec4::new(c.x, c.y, c.z, *a))
                .collect(),
        ),
        (
            SCALE_TEXTURE,
            cloud.scales.iter().map(|s| s.extend(0.0)).collect(),
        ),
        (ROTATION_TEXTURE, cloud.rotations.clone()),
    ];

    if let Some(bands) = &cloud.harmonics {
        for (name, band) in [
            (HARMONICS_L1_TEXTURE, &bands.l1),
            (HARMONICS_L2_TEXTURE, &bands.l2),
            (HARMONICS_L31_TEXTURE, &bands.l31),
            (HARMONICS_L32_TEXTURE, &bands.l32),
        ] {
            groups.push((name, band.iter().map(|v| v.extend(0.0)).collect()));
        }
    }

    groups
}
