//! Splatbake command-line tool.
//!
//! Bakes Gaussian-splat PLY reconstructions into the RGBA32F texture sets
//! consumed by the playback material: either one file at a time, or a
//! whole directory of frames for 4D playback.

mod exr_sink;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use exr_sink::ExrSink;
use splatbake_core::{CancelToken, SequenceOptions, bake_file, bake_sequence, frame_dir_name};

#[derive(Parser, Debug)]
#[command(name = "splatbake")]
#[command(version, about = "Bake Gaussian-splat PLY files into engine texture sets")]
struct Cli {
    /// Write a JSON report of the run to this path
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bake one PLY file into a texture set
    File {
        /// Path to the PLY file
        path: PathBuf,

        /// Output directory; defaults to a folder named after the file,
        /// next to it
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Bake a directory of PLY frames for 4D playback
    Sequence {
        /// Directory containing the *.ply frames
        dir: PathBuf,

        /// Name of the output model
        #[arg(long)]
        model: String,

        /// Output base directory; defaults to the parent of DIR
        #[arg(long)]
        out: Option<PathBuf>,

        /// Process frames one at a time instead of on a worker pool
        #[arg(long)]
        serial: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::File { path, out } => {
            let out_dir = match out {
                Some(out) => out,
                None => {
                    let stem = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "model".to_string());
                    path.parent().unwrap_or(Path::new(".")).join(stem)
                }
            };

            let mut sink = ExrSink::new(&out_dir)?;
            let bake = bake_file(&path, &mut sink)?;
            info!(
                vertices = bake.vertex_count,
                out = %out_dir.display(),
                "bake complete"
            );
            write_report(cli.report.as_deref(), &bake)?;
        }
        Command::Sequence {
            dir,
            model,
            out,
            serial,
        } => {
            let base = out.unwrap_or_else(|| dir.parent().unwrap_or(Path::new(".")).to_path_buf());
            let model_dir = base.join(&model);
            let options = SequenceOptions { parallel: !serial };

            let report = bake_sequence(
                &dir,
                &model,
                &options,
                |index| ExrSink::new(model_dir.join(frame_dir_name(index))),
                &CancelToken::new(),
            )?;

            write_report(cli.report.as_deref(), &report)?;
            if !report.success() {
                return Err("no frames in the sequence could be processed".into());
            }
        }
    }
    Ok(())
}

fn write_report<T: serde::Serialize>(
    path: Option<&Path>,
    report: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = path {
        serde_json::to_writer_pretty(std::fs::File::create(path)?, report)?;
        info!(path = %path.display(), "wrote report");
    }
    Ok(())
}
