use anyhow::{Context, Result};
use clap::Parser;
use motdet::background::ModelKind;
use motdet::capture::{open_source, SourceSpec};
use motdet::config::{LoopConfig, PipelineConfig};
use motdet::control::StdinControl;
use motdet::output::{LoopbackSink, SinkSet, SnapshotSink, Window};
use motdet::params::Parameters;
use motdet::pipeline::{FrameLoop, PipelineContext};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Play back still frames from a directory or a single image
    #[arg(long, value_name = "PATH", conflicts_with = "camera")]
    video: Option<PathBuf>,

    /// Capture from a live camera (the default when no source is given)
    #[arg(long)]
    camera: bool,

    /// Camera device index
    #[arg(long, default_value_t = 0)]
    device: u32,

    /// Low edge threshold, 0-255; the high threshold is twice this value
    #[arg(long, default_value_t = 100)]
    edge_threshold: i32,

    /// Side of the square closing kernel, 1-21
    #[arg(long, default_value_t = 5)]
    kernel_size: i32,

    /// Background model whose mask feeds contour extraction
    #[arg(long, value_enum, default_value_t = ModelKind::Neighbor)]
    contour_model: ModelKind,

    /// Seed of the contour color generator
    #[arg(long, default_value_t = 12345)]
    palette_seed: u64,

    /// Write PNG snapshots of every window into this directory
    #[arg(long, value_name = "DIR")]
    snapshot_dir: Option<PathBuf>,

    /// Frames between two snapshots
    #[arg(long, default_value_t = 1)]
    snapshot_every: u64,

    /// Stream a window to this v4l2loopback device
    #[arg(long, value_name = "DEVICE")]
    loopback: Option<PathBuf>,

    /// Window streamed to the loopback device
    #[arg(long, value_enum, default_value_t = Window::Contours)]
    loopback_window: Window,

    /// Loopback frame width
    #[arg(long, default_value_t = 640)]
    loopback_width: u32,

    /// Loopback frame height
    #[arg(long, default_value_t = 480)]
    loopback_height: u32,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Bounded wait for control input after each frame, in milliseconds
    #[arg(long, default_value_t = 30)]
    wait_ms: u64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("motdet starting");

    let source = match &args.video {
        Some(path) => SourceSpec::File(path.clone()),
        None => SourceSpec::Camera(args.device),
    };

    let config = PipelineConfig {
        parameters: Parameters::clamped(args.edge_threshold, args.kernel_size),
        contour_model: args.contour_model,
        palette_seed: args.palette_seed,
        ..PipelineConfig::default()
    };
    let context = PipelineContext::new(&config).context("Invalid pipeline configuration")?;

    let mut sinks = SinkSet::new();
    if let Some(dir) = &args.snapshot_dir {
        sinks.push(
            SnapshotSink::new(dir, args.snapshot_every)
                .context("Failed to prepare snapshot directory")?,
        );
    }
    if let Some(device) = &args.loopback {
        sinks.push(
            LoopbackSink::new(
                device,
                args.loopback_window,
                args.loopback_width,
                args.loopback_height,
            )
            .context("Failed to initialize v4l2loopback output")?,
        );
    }
    if sinks.is_empty() {
        tracing::info!("No display sink configured, frames are processed headless");
    }

    let capture = open_source(&source).context("Failed to open capture source")?;

    let loop_config = LoopConfig {
        wait: Duration::from_millis(args.wait_ms),
        max_frames: args.max_frames,
        ..LoopConfig::default()
    };

    tracing::info!("Type `q` to quit, `t N` to set the edge threshold, `k N` to set the kernel size");
    let mut control = StdinControl::spawn();

    let mut frame_loop = FrameLoop::new(context, loop_config);
    let summary = frame_loop
        .run(capture, &mut sinks, &mut control)
        .context("Frame loop failed")?;

    tracing::info!("Processed {} frames", summary.frames);
    Ok(())
}
