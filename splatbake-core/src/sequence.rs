//! Multi-file sequence batching for 4D playback.
//!
//! Discovers the PLY files of one animated model, assigns frame indices by
//! lexicographic filename order, and runs the single-file pipeline per
//! frame. Per-frame failures are recorded and never abort sibling frames;
//! the whole batch fails only when configuration is unusable before any
//! per-file work starts.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::bounds::Aabb;
use crate::pipeline::{FrameBake, PipelineError, bake_file};
use crate::sink::{ImageSink, SinkError, TextureHandle};

/// Errors that abort a sequence before any frame is processed.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("model name is empty")]
    EmptyModelName,

    #[error("no PLY files found in {}", dir.display())]
    NoFilesFound { dir: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Knobs for sequence processing.
#[derive(Debug, Clone)]
pub struct SequenceOptions {
    /// Process frames on a worker pool. Frame output order is unaffected;
    /// results are re-sorted by frame index.
    pub parallel: bool,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Cooperative cancellation flag, checked between frames. Cancelling
/// leaves completed frames' results intact and marks the run as partially
/// completed rather than erroring.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of one frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    /// 0-based frame index, assigned after the lexicographic sort.
    pub index: usize,
    /// Source file name within the sequence directory.
    pub file_name: String,
    /// Vertex rows in the source file (0 when the bake failed).
    pub vertex_count: usize,
    pub success: bool,
    /// Human-readable failure cause; empty on success.
    pub diagnostic: String,
    /// Bounds of the transformed positions, when the bake succeeded.
    pub bounds: Option<Aabb>,
    /// `(texture name, sink handle)` per stored texture.
    pub textures: Vec<(String, TextureHandle)>,
}

impl FrameReport {
    /// Zero-padded index string, e.g. frame 7 → `00007`.
    pub fn label(&self) -> String {
        frame_label(self.index)
    }
}

/// Zero-padded frame index string.
pub fn frame_label(index: usize) -> String {
    format!("{index:05}")
}

/// Conventional per-frame directory name, e.g. `frame_00007`.
pub fn frame_dir_name(index: usize) -> String {
    format!("frame_{index:05}")
}

/// Aggregated outcome of one sequence invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SequenceReport {
    pub model: String,
    /// Matching files discovered in the source directory.
    pub total_found: usize,
    /// Frames that baked successfully.
    pub frames_processed: usize,
    /// Whether the run was cut short by cancellation.
    pub cancelled: bool,
    /// Per-frame outcomes, ordered by frame index.
    pub frames: Vec<FrameReport>,
}

impl SequenceReport {
    /// Sequence-level success: at least one frame baked.
    pub fn success(&self) -> bool {
        self.frames_processed > 0
    }
}

/// Bake every PLY file in `source_dir` as one frame of `model_name`.
///
/// `make_sink` builds the image sink for a given frame index, so each
/// worker owns an isolated output location. Discovery is non-recursive;
/// filenames are sorted lexicographically ascending and that order defines
/// the contiguous 0-based frame indices regardless of filesystem
/// enumeration order.
pub fn bake_sequence<S, F>(
    source_dir: &Path,
    model_name: &str,
    options: &SequenceOptions,
    make_sink: F,
    cancel: &CancelToken,
) -> Result<SequenceReport, SequenceError>
where
    S: ImageSink,
    F: Fn(usize) -> Result<S, SinkError> + Sync,
{
    if model_name.is_empty() {
        return Err(SequenceError::EmptyModelName);
    }

    let files = discover_frames(source_dir)?;
    info!(
        model = model_name,
        frames = files.len(),
        dir = %source_dir.display(),
        "processing splat sequence"
    );

    let process = |(index, file_name): &(usize, String)| -> Option<FrameReport> {
        if cancel.is_cancelled() {
            return None;
        }
        Some(process_frame(
            *index,
            file_name,
            &source_dir.join(file_name),
            &make_sink,
        ))
    };

    let mut frames: Vec<FrameReport> = if options.parallel {
        files.par_iter().filter_map(process).collect()
    } else {
        files.iter().filter_map(process).collect()
    };
    frames.sort_by_key(|frame| frame.index);

    let frames_processed = frames.iter().filter(|f| f.success).count();
    let report = SequenceReport {
        model: model_name.to_string(),
        total_found: files.len(),
        frames_processed,
        cancelled: cancel.is_cancelled(),
        frames,
    };

    info!(
        model = model_name,
        processed = report.frames_processed,
        total = report.total_found,
        cancelled = report.cancelled,
        "sequence complete"
    );

    Ok(report)
}

/// List `*.ply` files (non-recursive, case-insensitive extension) and
/// sort them lexicographically; this order defines frame indices.
fn discover_frames(source_dir: &Path) -> Result<Vec<(usize, String)>, SequenceError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(source_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_ply = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ply"));
        if is_ply && path.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    if names.is_empty() {
        return Err(SequenceError::NoFilesFound {
            dir: source_dir.to_path_buf(),
        });
    }

    Ok(names.into_iter().enumerate().collect())
}

fn process_frame<S, F>(index: usize, file_name: &str, path: &Path, make_sink: &F) -> FrameReport
where
    S: ImageSink,
    F: Fn(usize) -> Result<S, SinkError>,
{
    let outcome = make_sink(index)
        .map_err(PipelineError::from)
        .and_then(|mut sink| bake_file(path, &mut sink));

    match outcome {
        Ok(FrameBake {
            vertex_count,
            bounds,
            textures,
        }) => FrameReport {
            index,
            file_name: file_name.to_string(),
            vertex_count,
            success: true,
            diagnostic: String::new(),
            bounds: Some(bounds),
            textures,
        },
        Err(error) => {
            warn!(
                frame = index,
                file = file_name,
                error = %error,
                "frame failed"
            );
            FrameReport {
                index,
                file_name: file_name.to_string(),
                vertex_count: 0,
                success: false,
                diagnostic: error.to_string(),
                bounds: None,
                textures: Vec::new(),
            }
        }
    }
}
