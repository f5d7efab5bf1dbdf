//! List, add, and delete timeline regions.

use std::path::{Path, PathBuf};

use reframe_project_model::{
    Easing, LoadedProject, RegionEditor, RegionId, RegionPatch, TimelineSpan, TrimType, ZoomMode,
};

use super::{load_project, probe_sources, save_project};

pub struct ZoomArgs {
    pub duration: Option<f64>,
    pub level: Option<f64>,
    pub easing: Option<Easing>,
    pub transition: Option<f64>,
    pub target_x: Option<f64>,
    pub target_y: Option<f64>,
    pub fixed: bool,
}

/// Load the project with a known video duration and the playhead at `at`.
fn editor_at(path: &Path, at: f64) -> anyhow::Result<(LoadedProject, RegionEditor)> {
    let mut project = load_project(path)?;
    probe_sources(&mut project);
    let mut editor = project.editor();
    let Some(duration) = editor.video_duration() else {
        anyhow::bail!("Screen video duration is unknown; add a screen source that ffprobe can read");
    };
    if !(0.0..duration).contains(&at) {
        anyhow::bail!("Start time {at}s is outside the video (0 - {duration:.2}s)");
    }
    editor.set_playhead(at);
    Ok((project, editor))
}

fn commit(mut project: LoadedProject, editor: RegionEditor) -> anyhow::Result<()> {
    project.timeline = editor.into_timeline();
    save_project(&mut project)
}

pub fn list(path: PathBuf, json: bool) -> anyhow::Result<()> {
    let project = load_project(&path)?;
    let timeline = &project.timeline;

    if json {
        println!("{}", serde_json::to_string_pretty(timeline)?);
        return Ok(());
    }

    if timeline.is_empty() {
        println!("No regions.");
        return Ok(());
    }

    println!("{:<6} {:<5} {:>9} {:>9} {:>6}  details", "id", "kind", "start", "end", "z");
    for z in timeline.zoom_regions() {
        println!(
            "{:<6} {:<5} {:>9.3} {:>9.3} {:>6}  level {:.2}, {}, {:?}, target ({:+.2}, {:+.2})",
            z.id.0,
            "zoom",
            z.start_time,
            z.end_time(),
            z.z_index,
            z.zoom_level,
            z.easing,
            z.mode,
            z.target_x,
            z.target_y
        );
    }
    for c in timeline.cut_regions() {
        let trim = match c.trim_type {
            Some(TrimType::Start) => "trim start",
            Some(TrimType::End) => "trim end",
            None => "",
        };
        println!(
            "{:<6} {:<5} {:>9.3} {:>9.3} {:>6}  {trim}",
            c.id.0,
            "cut",
            c.start_time,
            c.end_time(),
            c.z_index
        );
    }

    Ok(())
}

pub fn add_zoom(path: PathBuf, at: f64, args: ZoomArgs) -> anyhow::Result<()> {
    let (project, mut editor) = editor_at(&path, at)?;
    let mouse = project
        .load_mouse_track()
        .map_err(|e| anyhow::anyhow!("Failed to load mouse metadata: {e}"))?;

    let id = editor
        .add_zoom_region(&mouse, &project.project.recording)
        .ok_or_else(|| anyhow::anyhow!("No room for a zoom region at {at}s"))?;

    let room = editor.video_duration().map_or(f64::INFINITY, |d| d - at);
    let patch = RegionPatch {
        duration: args.duration.map(|d| d.min(room)),
        zoom_level: args.level,
        easing: args.easing,
        transition_duration: args.transition,
        target_x: args.target_x,
        target_y: args.target_y,
        mode: args.fixed.then_some(ZoomMode::Fixed),
        ..RegionPatch::default()
    };
    if patch != RegionPatch::default() {
        editor.update_region(id, &patch)?;
    }

    if let Some(z) = editor.timeline().zoom_region(id) {
        println!(
            "Added zoom {id}: {:.2}s - {:.2}s, level {:.2}, target ({:+.2}, {:+.2})",
            z.start_time,
            z.end_time(),
            z.zoom_level,
            z.target_x,
            z.target_y
        );
    }
    commit(project, editor)
}

pub fn add_cut(
    path: PathBuf,
    at: f64,
    duration: Option<f64>,
    trim: Option<TrimType>,
) -> anyhow::Result<()> {
    let (project, mut editor) = editor_at(&path, at)?;

    let mut patch = RegionPatch::default().with_start(at);
    if let Some(duration) = duration {
        patch = patch.with_duration(duration);
    }
    if let Some(trim) = trim {
        patch = patch.with_trim(trim);
    }

    let id = editor
        .add_cut_region(patch)?
        .ok_or_else(|| anyhow::anyhow!("No room for a cut region at {at}s"))?;
    if let Some(c) = editor.timeline().cut_region(id) {
        println!("Added cut {id}: {:.2}s - {:.2}s", c.start_time, c.end_time());
    }
    commit(project, editor)
}

pub fn delete(path: PathBuf, id: u64) -> anyhow::Result<()> {
    let mut project = load_project(&path)?;
    let id = RegionId(id);
    if !project.timeline.contains(id) {
        anyhow::bail!("No region with id {}", id.0);
    }

    let mut editor = project.editor();
    editor.delete_region(id);
    project.timeline = editor.into_timeline();
    save_project(&mut project)?;
    println!("Deleted {id}");
    Ok(())
}
