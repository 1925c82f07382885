// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use photobooth::backends::camera::CameraBackendType;
use photobooth::booth::ProfileKind;
use photobooth::config::Config;
use photobooth::constants::camera as camera_consts;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Instant photo booth for V4L2 webcams")]
#[command(version = env!("BOOTH_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/photobooth/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the booth in the terminal (default)
    Terminal,

    /// List available cameras
    List,

    /// Take shots and print them as JSON lines
    Snap {
        /// Number of shots to take
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// Booth profile: polaroid, instant, studio
        #[arg(short, long)]
        profile: Option<ProfileKind>,

        /// Camera backend: v4l2, test-pattern, still-image
        #[arg(short, long)]
        backend: Option<CameraBackendType>,

        /// Device path (or image path for still-image)
        #[arg(short, long)]
        device: Option<String>,

        /// Request 1280x720 instead of the device default
        #[arg(long, conflicts_with_all = ["width", "height"])]
        hd: bool,

        /// Requested capture width
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// Requested capture height
        #[arg(long, requires = "width")]
        height: Option<u32>,

        /// Overlay image or SVG drawn over the print
        #[arg(short, long)]
        overlay: Option<PathBuf>,

        /// Wait for shots to finish developing before printing
        #[arg(short, long)]
        wait: bool,

        /// Replace image data with its size in the output
        #[arg(long)]
        summary: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photobooth=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Some(Commands::List) => cli::list_cameras(&config),
        Some(Commands::Snap {
            count,
            profile,
            backend,
            device,
            hd,
            width,
            height,
            overlay,
            wait,
            summary,
        }) => cli::snap(
            config,
            cli::SnapOptions {
                count,
                profile,
                backend,
                device,
                resolution: if hd {
                    Some(camera_consts::DEFAULT_RESOLUTION_HINT)
                } else {
                    width.zip(height)
                },
                overlay,
                wait,
                summary,
            },
        ),
        Some(Commands::Terminal) | None => photobooth::terminal::run(config),
    }
}
