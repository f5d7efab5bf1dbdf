pub mod analyze;
pub mod check;
pub mod export;
pub mod frame;
pub mod info;
pub mod init;
pub mod regions;
pub mod validate;

use std::path::Path;

use reframe_project_model::{LoadedProject, TrackRef};
use reframe_render_engine::ffmpeg::{command_exists, probe_video};

pub fn load_project(path: &Path) -> anyhow::Result<LoadedProject> {
    LoadedProject::load(path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))
}

/// Bump the modified time and write the project back.
pub fn save_project(project: &mut LoadedProject) -> anyhow::Result<()> {
    project.touch();
    project
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))
}

/// Fill in duration and size for tracks that were never probed.
///
/// Returns whether anything changed. Silently does nothing without ffprobe.
pub fn probe_sources(project: &mut LoadedProject) -> bool {
    if !command_exists("ffprobe") {
        tracing::debug!("ffprobe not found, skipping source probe");
        return false;
    }

    let root = project.root.clone();
    let sources = &mut project.project.sources;
    [sources.screen.as_mut(), sources.webcam.as_mut()]
        .into_iter()
        .flatten()
        .fold(false, |changed, track| probe_track(&root, track) || changed)
}

fn probe_track(root: &Path, track: &mut TrackRef) -> bool {
    if track.duration_secs > 0.0 && track.size().is_some() {
        return false;
    }
    let path = root.join(&track.path);
    match probe_video(&path) {
        Ok(info) => {
            track.duration_secs = info.duration_secs;
            track.width = info.width;
            track.height = info.height;
            tracing::debug!(path = %path.display(), duration = info.duration_secs, "Probed source");
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to probe source");
            false
        }
    }
}
