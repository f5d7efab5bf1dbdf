//! Export a project to video.

use std::io::Write;
use std::path::PathBuf;

use reframe_common::config::AppConfig;
use reframe_project_model::{ExportConfig, ExportFormat};
use reframe_render_engine::export::{
    export_project, CancelFlag, ExportJob, ExportProgress, ProgressCallback,
};

use super::load_project;

pub struct ExportArgs {
    pub path: PathBuf,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub workers: Option<usize>,
}

pub async fn run(args: ExportArgs, app_config: &AppConfig) -> anyhow::Result<()> {
    println!("Exporting project at: {}", args.path.display());

    let project = load_project(&args.path)?;
    let defaults = &project.project.export;

    let format = match args.format.as_deref() {
        Some(name) => ExportFormat::from_name(name).ok_or_else(|| {
            anyhow::anyhow!("Unknown format: {name}. Use: mp4-h264, mp4-h265, gif, webm")
        })?,
        None => defaults.format,
    };
    let config = ExportConfig {
        format,
        width: args.width.unwrap_or(defaults.width),
        height: args.height.unwrap_or(defaults.height),
        fps: args.fps.unwrap_or(defaults.fps),
        video_bitrate_kbps: defaults.video_bitrate_kbps,
    };

    let output_path = args.output.unwrap_or_else(|| {
        args.path
            .join("exports")
            .join(format!("{}.{}", project.project.name, format.extension()))
    });
    let workers = args
        .workers
        .unwrap_or(app_config.export.parallel_workers);

    println!("  Output: {}", output_path.display());
    println!("  Format: {format:?}");
    println!(
        "  Resolution: {}x{} @ {}fps",
        config.width, config.height, config.fps
    );
    if workers > 1 {
        println!("  Workers: {workers}");
    }

    let job = ExportJob {
        project_dir: args.path,
        output_path: output_path.clone(),
        config,
        start_secs: args.start,
        end_secs: args.end,
        workers,
    };

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling export...");
            on_interrupt.cancel();
        }
    });

    let progress_cb: ProgressCallback = Box::new(|p: ExportProgress| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.frames_rendered,
            p.total_frames,
            p.eta_secs,
        );
        let _ = std::io::stdout().flush();
    });

    match export_project(job, app_config, cancel, Some(progress_cb)).await {
        Ok(summary) => {
            println!(
                "\nExport complete: {} ({} frames, {} cut, {:.1}s)",
                output_path.display(),
                summary.frames_written,
                summary.frames_skipped,
                summary.elapsed_secs
            );
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            println!("\nExport cancelled, partial output removed.");
            Ok(())
        }
        Err(e) => {
            println!();
            Err(anyhow::anyhow!("Export failed: {e}"))
        }
    }
}
