//! Reframe CLI: inspect, edit, render, and export projects.
//!
//! Usage:
//!   reframe init <NAME>            Create a new project
//!   reframe info <PATH>            Show project information
//!   reframe validate <PATH>        Validate a project bundle
//!   reframe analyze <PATH>         Generate zoom regions from clicks
//!   reframe regions <PATH> ...     List, add, or delete regions
//!   reframe frame <PATH> --at <T>  Render one frame to PNG
//!   reframe export <PATH>          Export a project to video
//!   reframe check                  Check external tools

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use reframe_common::config::AppConfig;
use reframe_project_model::{Easing, TrimType};

mod commands;

#[derive(Parser)]
#[command(
    name = "reframe",
    about = "Zoom, pan, and frame screen recordings",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project
    Init {
        /// Project name
        name: String,

        /// Parent directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Screen recording to copy into the project
        #[arg(long)]
        screen: Option<PathBuf>,

        /// Webcam recording to copy into the project
        #[arg(long)]
        webcam: Option<PathBuf>,

        /// Mouse metadata sidecar to copy into the project
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Capture width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Capture height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Export FPS
        #[arg(long, default_value = "60")]
        fps: u32,
    },

    /// Show project information
    Info {
        /// Path to the project directory
        path: PathBuf,
    },

    /// Validate a project bundle
    Validate {
        /// Path to the project directory
        path: PathBuf,
    },

    /// Generate zoom regions from clusters of mouse clicks
    Analyze {
        /// Path to the project directory
        path: PathBuf,

        /// Clicks closer than this join one region (seconds)
        #[arg(long, default_value = "1.5")]
        cluster_gap: f64,

        /// Zoom level of generated regions
        #[arg(long, default_value = "2.0")]
        zoom_level: f64,

        /// Remove existing auto-mode zoom regions first
        #[arg(long)]
        replace: bool,

        /// Print the regions without saving them
        #[arg(long)]
        dry_run: bool,
    },

    /// Edit zoom and cut regions
    Regions {
        /// Path to the project directory
        path: PathBuf,

        #[command(subcommand)]
        action: RegionsAction,
    },

    /// Render a single composited frame to PNG
    Frame {
        /// Path to the project directory
        path: PathBuf,

        /// Timestamp to render (seconds)
        #[arg(long)]
        at: f64,

        /// Output PNG path
        #[arg(short, long, default_value = "frame.png")]
        output: PathBuf,

        /// Output width (defaults to the project export width)
        #[arg(long)]
        width: Option<u32>,

        /// Output height (defaults to the project export height)
        #[arg(long)]
        height: Option<u32>,
    },

    /// Export a project to video
    Export {
        /// Path to the project directory
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: mp4-h264, mp4-h265, gif, webm
        #[arg(long)]
        format: Option<String>,

        /// Output width
        #[arg(long)]
        width: Option<u32>,

        /// Output height
        #[arg(long)]
        height: Option<u32>,

        /// Output FPS
        #[arg(long)]
        fps: Option<u32>,

        /// Start of the exported range (seconds)
        #[arg(long)]
        start: Option<f64>,

        /// End of the exported range (seconds)
        #[arg(long)]
        end: Option<f64>,

        /// Render worker threads (0 or 1 renders sequentially)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Check that external tools are available
    Check,
}

#[derive(Subcommand)]
enum RegionsAction {
    /// List all regions
    List {
        /// Print the timeline as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a zoom region
    AddZoom {
        /// Start time (seconds)
        #[arg(long)]
        at: f64,

        /// Duration (seconds)
        #[arg(long)]
        duration: Option<f64>,

        /// Zoom level (>= 1)
        #[arg(long)]
        level: Option<f64>,

        /// Easing key, e.g. easeInOutCubic
        #[arg(long)]
        easing: Option<Easing>,

        /// Ease in/out length (seconds)
        #[arg(long)]
        transition: Option<f64>,

        /// Horizontal target in [-0.5, 0.5]
        #[arg(long, allow_hyphen_values = true)]
        target_x: Option<f64>,

        /// Vertical target in [-0.5, 0.5]
        #[arg(long, allow_hyphen_values = true)]
        target_y: Option<f64>,

        /// Disable pointer-follow panning
        #[arg(long)]
        fixed: bool,
    },

    /// Add a cut region
    AddCut {
        /// Start time (seconds)
        #[arg(long)]
        at: f64,

        /// Duration (seconds)
        #[arg(long)]
        duration: Option<f64>,

        /// Mark as a trim handle
        #[arg(long, value_enum)]
        trim: Option<TrimArg>,
    },

    /// Delete a region by id
    Delete {
        /// Region id
        id: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TrimArg {
    Start,
    End,
}

impl From<TrimArg> for TrimType {
    fn from(arg: TrimArg) -> Self {
        match arg {
            TrimArg::Start => TrimType::Start,
            TrimArg::End => TrimType::End,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    reframe_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Init {
            name,
            output,
            screen,
            webcam,
            metadata,
            width,
            height,
            fps,
        } => commands::init::run(commands::init::InitArgs {
            name,
            output,
            screen,
            webcam,
            metadata,
            width,
            height,
            fps,
        }),
        Commands::Info { path } => commands::info::run(path),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Analyze {
            path,
            cluster_gap,
            zoom_level,
            replace,
            dry_run,
        } => commands::analyze::run(path, cluster_gap, zoom_level, replace, dry_run),
        Commands::Regions { path, action } => match action {
            RegionsAction::List { json } => commands::regions::list(path, json),
            RegionsAction::AddZoom {
                at,
                duration,
                level,
                easing,
                transition,
                target_x,
                target_y,
                fixed,
            } => commands::regions::add_zoom(
                path,
                at,
                commands::regions::ZoomArgs {
                    duration,
                    level,
                    easing,
                    transition,
                    target_x,
                    target_y,
                    fixed,
                },
            ),
            RegionsAction::AddCut { at, duration, trim } => {
                commands::regions::add_cut(path, at, duration, trim.map(TrimType::from))
            }
            RegionsAction::Delete { id } => commands::regions::delete(path, id),
        },
        Commands::Frame {
            path,
            at,
            output,
            width,
            height,
        } => commands::frame::run(path, at, output, width, height, &config),
        Commands::Export {
            path,
            output,
            format,
            width,
            height,
            fps,
            start,
            end,
            workers,
        } => {
            commands::export::run(
                commands::export::ExportArgs {
                    path,
                    output,
                    format,
                    width,
                    height,
                    fps,
                    start,
                    end,
                    workers,
                },
                &config,
            )
            .await
        }
        Commands::Check => commands::check::run(&config),
    }
}
