//! Export configuration and job management.
//!
//! An export walks the output timeline frame by frame: cut frames are
//! skipped, every other frame is seeked, composited, serialized to RGBA and
//! streamed to a [`FrameSink`] in presentation order.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use reframe_common::clock::{frame_time_secs, total_frames};
use reframe_common::config::AppConfig;
use reframe_common::error::{ReframeError, ReframeResult};
use reframe_processing_core::{exported_frame_count, is_in_cut_region};
use reframe_project_model::{CutRegion, ExportConfig, LoadedProject};

use crate::assets::load_background;
use crate::compositor::{FrameRenderer, Scene};
use crate::ffmpeg::{FfmpegEncoder, FfmpegFrameSource};
use crate::reorder::export_frames_parallel;
use crate::source::{FrameSink, FrameSource, MediaSources};

/// An export job ready to be rendered.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Project root directory.
    pub project_dir: PathBuf,

    /// Output file path.
    pub output_path: PathBuf,

    /// Export configuration.
    pub config: ExportConfig,

    /// Start time offset (for partial exports).
    pub start_secs: Option<f64>,

    /// End time (for partial exports).
    pub end_secs: Option<f64>,

    /// Render worker threads; `0` or `1` renders sequentially.
    pub workers: usize,
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

/// Export progress report.
#[derive(Debug, Clone, Serialize)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames handed to the sink so far.
    pub frames_rendered: u64,

    /// Total frames on the export timeline, cut frames included.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

/// Cooperative cancellation shared between the caller and an export or
/// preview loop. Checked between frames.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The slice of the source timeline to export and its frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExportPlan {
    pub fps: u32,
    pub start_secs: f64,
    pub end_secs: f64,
}

impl ExportPlan {
    /// Export all of `[0, duration_secs)`.
    pub fn new(duration_secs: f64, fps: u32) -> Self {
        Self {
            fps: fps.max(1),
            start_secs: 0.0,
            end_secs: duration_secs.max(0.0),
        }
    }

    /// Narrow to `[start, end)`, clamped to the current range.
    pub fn with_range(mut self, start: Option<f64>, end: Option<f64>) -> Self {
        if let Some(end) = end.filter(|e| e.is_finite()) {
            self.end_secs = end.clamp(self.start_secs, self.end_secs);
        }
        if let Some(start) = start.filter(|s| s.is_finite()) {
            self.start_secs = start.clamp(self.start_secs, self.end_secs);
        }
        self
    }

    pub fn duration_secs(&self) -> f64 {
        (self.end_secs - self.start_secs).max(0.0)
    }

    /// Frames on the export timeline, cut frames included.
    pub fn total_frames(&self) -> u64 {
        total_frames(self.duration_secs(), self.fps)
    }

    /// Source timestamp of frame `index`.
    pub fn frame_time(&self, index: u64) -> f64 {
        self.start_secs + frame_time_secs(index, self.fps)
    }

    /// Frames that will reach the sink once `cuts` are skipped.
    pub fn output_frames(&self, cuts: &[CutRegion]) -> u64 {
        if self.start_secs == 0.0 {
            return exported_frame_count(self.duration_secs(), self.fps, cuts);
        }
        (0..self.total_frames())
            .filter(|&i| !is_in_cut_region(self.frame_time(i), cuts))
            .count() as u64
    }
}

/// Outcome of a finished export.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportSummary {
    pub total_frames: u64,
    pub frames_written: u64,
    pub frames_skipped: u64,
    pub elapsed_secs: f64,
}

/// Emits monotonic progress reports.
pub(crate) struct ProgressReporter<'a> {
    callback: Option<&'a ProgressCallback>,
    total_frames: u64,
    started: Instant,
}

impl<'a> ProgressReporter<'a> {
    pub(crate) fn new(total_frames: u64, callback: Option<&'a ProgressCallback>) -> Self {
        Self {
            callback,
            total_frames,
            started: Instant::now(),
        }
    }

    /// Report that frame indices `< frames_done` are handled.
    pub(crate) fn report(&self, frames_done: u64, frames_rendered: u64, stage: ExportStage) {
        let Some(cb) = self.callback else {
            return;
        };
        let progress = match stage {
            ExportStage::Preparing => 0.0,
            ExportStage::Complete => 1.0,
            _ if self.total_frames == 0 => 0.0,
            _ => (frames_done as f64 / self.total_frames as f64).clamp(0.0, 1.0),
        };
        let elapsed_secs = self.started.elapsed().as_secs_f64();
        let eta_secs = if progress > 0.0 && stage == ExportStage::Rendering {
            (elapsed_secs / progress) - elapsed_secs
        } else {
            0.0
        }
        .max(0.0);

        cb(ExportProgress {
            progress,
            frames_rendered,
            total_frames: self.total_frames,
            eta_secs,
            stage,
        });
    }

    pub(crate) fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Attach `stage` to an error unless it already names one.
pub(crate) fn in_stage(stage: &'static str, time_secs: f64, err: ReframeError) -> ReframeError {
    match err {
        err @ (ReframeError::Export { .. } | ReframeError::Cancelled { .. }) => err,
        other => ReframeError::export(stage, format!("at {time_secs:.3}s: {other}")),
    }
}

/// Render and stream every non-cut frame of `plan`, strictly in order.
///
/// Cancellation and sink failures are checked between frames. On error the
/// sink is left as is; see [`export_with_sink`] for cleanup.
pub async fn export_frames(
    renderer: &mut FrameRenderer,
    sources: &mut MediaSources,
    plan: &ExportPlan,
    sink: &mut dyn FrameSink,
    cancel: &CancelFlag,
    progress: Option<&ProgressCallback>,
) -> ReframeResult<ExportSummary> {
    let total = plan.total_frames();
    let reporter = ProgressReporter::new(total, progress);
    let mut summary = ExportSummary {
        total_frames: total,
        ..ExportSummary::default()
    };
    tracing::info!(
        total_frames = total,
        fps = plan.fps,
        start_secs = plan.start_secs,
        end_secs = plan.end_secs,
        "Rendering frames"
    );
    reporter.report(0, 0, ExportStage::Preparing);

    for index in 0..total {
        if cancel.is_cancelled() {
            return Err(ReframeError::Cancelled { frame: index });
        }
        if let Some(reason) = sink.fatal_error() {
            return Err(ReframeError::export("encoding", reason));
        }

        let t = plan.frame_time(index);
        if is_in_cut_region(t, &renderer.scene().cut_regions) {
            summary.frames_skipped += 1;
            continue;
        }

        sources.seek_all(t).map_err(|e| in_stage("seeking", t, e))?;
        // Let the decoder settle before the frame is read.
        tokio::task::yield_now().await;

        renderer
            .render_sources(t, sources)
            .map_err(|e| in_stage("rendering", t, e))?;
        sink.write_frame(&renderer.rgba())
            .map_err(|e| in_stage("encoding", t, e))?;

        summary.frames_written += 1;
        tracing::debug!(frame = index, time_secs = t, "Frame written");
        reporter.report(index + 1, summary.frames_written, ExportStage::Rendering);
    }

    summary.elapsed_secs = reporter.elapsed_secs();
    Ok(summary)
}

/// Finish the sink after a successful loop, or abort it after a failed one.
pub(crate) fn conclude(
    result: ReframeResult<ExportSummary>,
    sink: &mut dyn FrameSink,
    reporter: &ProgressReporter<'_>,
) -> ReframeResult<ExportSummary> {
    let outcome = result.and_then(|summary| {
        reporter.report(
            summary.total_frames,
            summary.frames_written,
            ExportStage::Finalizing,
        );
        sink.finish()
            .map_err(|e| in_stage("finalizing", summary.elapsed_secs, e))?;
        Ok(summary)
    });

    match outcome {
        Ok(summary) => {
            reporter.report(
                summary.total_frames,
                summary.frames_written,
                ExportStage::Complete,
            );
            tracing::info!(
                frames = summary.frames_written,
                skipped = summary.frames_skipped,
                elapsed_secs = summary.elapsed_secs,
                "Export finished"
            );
            Ok(summary)
        }
        Err(err) => {
            if err.is_cancelled() {
                tracing::info!(error = %err, "Export cancelled");
            } else {
                tracing::error!(error = %err, stage = err.stage(), "Export failed");
            }
            sink.abort();
            reporter.report(0, 0, ExportStage::Failed);
            Err(err)
        }
    }
}

/// Run [`export_frames`] and own the sink's lifecycle: finish it on
/// success, abort it (discarding partial output) on any failure.
pub async fn export_with_sink(
    renderer: &mut FrameRenderer,
    sources: &mut MediaSources,
    plan: &ExportPlan,
    sink: &mut dyn FrameSink,
    cancel: &CancelFlag,
    progress: Option<&ProgressCallback>,
) -> ReframeResult<ExportSummary> {
    let reporter = ProgressReporter::new(plan.total_frames(), progress);
    let result = export_frames(renderer, sources, plan, sink, cancel, progress).await;
    conclude(result, sink, &reporter)
}

fn preparing(err: impl std::fmt::Display) -> ReframeError {
    ReframeError::export("preparing", err.to_string())
}

/// Export the project to a video file through ffmpeg.
///
/// This is the main entry point for rendering.
pub async fn export_project(
    job: ExportJob,
    app_config: &AppConfig,
    cancel: CancelFlag,
    progress: Option<ProgressCallback>,
) -> ReframeResult<ExportSummary> {
    tracing::info!(
        output = %job.output_path.display(),
        format = ?job.config.format,
        workers = job.workers,
        "Starting export"
    );

    if !job.project_dir.exists() {
        return Err(ReframeError::render("Project directory does not exist"));
    }

    let project = LoadedProject::load(&job.project_dir)
        .map_err(|e| preparing(format!("Failed to load project: {e}")))?;
    let screen = project
        .project
        .sources
        .screen
        .as_ref()
        .ok_or_else(|| preparing("Project does not contain a screen source"))?;
    let screen_path = project.resolve(&screen.path);
    let webcam_path = project
        .project
        .sources
        .webcam
        .as_ref()
        .map(|track| project.resolve(&track.path))
        .filter(|path| {
            let exists = path.exists();
            if !exists {
                tracing::warn!(path = %path.display(), "Webcam source missing, exporting without it");
            }
            exists
        });

    let open_sources = {
        let screen_path = screen_path.clone();
        let webcam_path = webcam_path.clone();
        move || -> ReframeResult<MediaSources> {
            let video = FfmpegFrameSource::open(&screen_path)?;
            let webcam = match &webcam_path {
                Some(path) => Some(Box::new(FfmpegFrameSource::open(path)?) as Box<dyn FrameSource>),
                None => None,
            };
            Ok(MediaSources::new(Box::new(video), webcam))
        }
    };
    let mut sources = open_sources().map_err(preparing)?;

    let mouse = project.load_mouse_track().map_err(preparing)?;
    if mouse.was_resorted() {
        tracing::warn!("Mouse metadata was out of order and has been re-sorted");
    }

    let duration = project
        .project
        .video_duration()
        .or_else(|| Some(sources.duration_secs()).filter(|d| *d > 0.0))
        .ok_or_else(|| preparing("Screen video duration is unknown"))?;
    let plan = ExportPlan::new(duration, job.config.fps).with_range(job.start_secs, job.end_secs);
    if plan.total_frames() == 0 {
        return Err(preparing("Export range resolved to zero frames"));
    }

    let background = match load_background(&project, app_config) {
        Ok(bitmap) => bitmap,
        Err(err) => {
            tracing::warn!(error = %err, "Background image unavailable, using plain fill");
            None
        }
    };
    let scene = Scene::from_project(&project, mouse, sources.video.size());
    let mut renderer =
        FrameRenderer::new(scene, background, job.config.width, job.config.height)?;
    tracing::info!(
        frames = plan.output_frames(&renderer.scene().cut_regions),
        zoom_regions = renderer.scene().zoom_regions.len(),
        cut_regions = renderer.scene().cut_regions.len(),
        "Export plan ready"
    );

    let mut sink = FfmpegEncoder::spawn(&job.config, &job.output_path)?;

    let summary = if job.workers > 1 {
        let workers = job.workers;
        let task = tokio::task::spawn_blocking(move || {
            let reporter = ProgressReporter::new(plan.total_frames(), progress.as_ref());
            let result = export_frames_parallel(
                &renderer,
                open_sources,
                workers,
                &plan,
                &mut sink,
                &cancel,
                progress.as_ref(),
            );
            conclude(result, &mut sink, &reporter)
        });
        task.await
            .map_err(|e| ReframeError::export("rendering", format!("Render task failed: {e}")))??
    } else {
        export_with_sink(
            &mut renderer,
            &mut sources,
            &plan,
            &mut sink,
            &cancel,
            progress.as_ref(),
        )
        .await?
    };

    tracing::info!(output = %job.output_path.display(), "Export written");
    Ok(summary)
}
