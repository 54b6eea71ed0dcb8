//! Splatbake Core Crate
//!
//! Converts Gaussian-splat point clouds (parsed by `splatbake-ply`) into
//! fixed-layout RGBA32F texture buffers for a rendering pipeline, and
//! batches whole directories of PLY files into per-frame texture sets for
//! 4D playback.
//!
//! ## Modules
//!
//! - [`types`]: CPU-side splat attribute arrays
//! - [`transform`]: raw columns → engine-space attributes
//! - [`bounds`]: axis-aligned bounds over transformed positions
//! - [`pack`]: near-square row-major texture packing
//! - [`sink`]: the image-store seam ([`ImageSink`])
//! - [`pipeline`]: single-file driver
//! - [`sequence`]: multi-file frame batching

pub mod bounds;
pub mod pack;
pub mod pipeline;
pub mod sequence;
pub mod sink;
pub mod transform;
pub mod types;

pub use bounds::{Aabb, BoundsError, compute_bounds};
pub use pack::{MIN_POINT_COUNT, PackError, PackedTexture, pack, texture_extent};
pub use pipeline::{FrameBake, PipelineError, bake_bytes, bake_file, parse_splats};
pub use sequence::{
    CancelToken, FrameReport, SequenceError, SequenceOptions, SequenceReport, bake_sequence,
    frame_dir_name, frame_label,
};
pub use sink::{ImageSink, MemorySink, SinkError, StoredImage, TextureHandle};
pub use transform::{AttributeError, collect_splats, sh0_to_rgb, transform_columns};
pub use types::{HarmonicBands, SplatCloud, SplatData};
