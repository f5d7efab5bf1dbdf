//! Render one composited frame to a PNG.

use std::path::PathBuf;

use reframe_common::config::AppConfig;
use reframe_processing_core::skip_cuts;
use reframe_render_engine::assets::{load_background, save_png};
use reframe_render_engine::ffmpeg::FfmpegFrameSource;
use reframe_render_engine::{FrameRenderer, FrameSource, MediaSources, Scene};

use super::load_project;

pub fn run(
    path: PathBuf,
    at: f64,
    output: PathBuf,
    width: Option<u32>,
    height: Option<u32>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let project = load_project(&path)?;
    let screen = project
        .project
        .sources
        .screen
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Project does not contain a screen source"))?;

    let video = FfmpegFrameSource::open(project.resolve(&screen.path))?;
    let webcam = match &project.project.sources.webcam {
        Some(track) if project.resolve(&track.path).exists() => Some(Box::new(
            FfmpegFrameSource::open(project.resolve(&track.path))?,
        ) as Box<dyn FrameSource>),
        _ => None,
    };
    let video_size = video.size();
    let mut sources = MediaSources::new(Box::new(video), webcam);

    let mouse = project
        .load_mouse_track()
        .map_err(|e| anyhow::anyhow!("Failed to load mouse metadata: {e}"))?;
    let background = load_background(&project, config).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Background image unavailable, using plain fill");
        None
    });

    let scene = Scene::from_project(&project, mouse, video_size);
    let t = skip_cuts(at.max(0.0), &scene.cut_regions).min(sources.duration_secs());
    if t != at {
        println!("  {at}s is cut or out of range, rendering {t:.3}s instead");
    }

    let mut renderer = FrameRenderer::new(
        scene,
        background,
        width.unwrap_or(project.project.export.width),
        height.unwrap_or(project.project.export.height),
    )?;
    sources.seek_all(t)?;
    renderer.render_sources(t, &sources)?;
    save_png(renderer.surface(), &output)?;

    println!(
        "Rendered {}x{} frame at {t:.3}s to {}",
        renderer.width(),
        renderer.height(),
        output.display()
    );
    Ok(())
}
