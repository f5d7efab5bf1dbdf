//! Show project information.

use std::path::PathBuf;

use reframe_processing_core::{edited_duration, exported_frame_count};
use reframe_project_model::{Background, TrackRef};

use super::load_project;

fn describe_track(label: &str, track: &TrackRef) {
    match track.size() {
        Some(size) => println!(
            "  {label}: {} ({:.1}s, {}x{})",
            track.path, track.duration_secs, size.width, size.height
        ),
        None => println!("  {label}: {} (not probed)", track.path),
    }
}

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let project = load_project(&path)?;
    let p = &project.project;

    println!("Project: {}", p.name);
    println!("  ID: {}", p.id);
    println!("  Created: {}", p.created_at);
    println!("  Modified: {}", p.modified_at);
    println!();

    println!("Recording:");
    println!(
        "  Capture area: {}x{} at ({}, {})",
        p.recording.width, p.recording.height, p.recording.x, p.recording.y
    );
    println!();

    println!("Sources:");
    if let Some(ref t) = p.sources.screen {
        describe_track("Screen", t);
    }
    if let Some(ref t) = p.sources.webcam {
        describe_track("Webcam", t);
    }
    if let Some(ref m) = p.sources.metadata {
        println!("  Mouse metadata: {m}");
    }
    println!();

    println!("Frame:");
    let background = match &p.frame.background {
        Background::Color { color } => format!("color {color}"),
        Background::LinearGradient {
            direction,
            from,
            to,
        } => format!("linear gradient {from} -> {to} ({direction:?})"),
        Background::RadialGradient { from, to } => format!("radial gradient {from} -> {to}"),
        Background::Image { path } => format!("image {path}"),
        Background::Wallpaper { name } => format!("wallpaper {name}"),
    };
    println!("  Background: {background}");
    println!(
        "  Padding: {}%, radius: {}px, border: {}px, shadow blur: {}px",
        p.frame.padding, p.frame.border_radius, p.frame.border_width, p.frame.shadow.blur
    );
    println!(
        "  Webcam: {} ({}% at {:?})",
        if p.webcam.visible { "visible" } else { "hidden" },
        p.webcam.size,
        p.webcam.position
    );
    println!();

    let cuts = project.timeline.cut_region_list();
    println!("Timeline:");
    println!("  Zoom regions: {}", project.timeline.zoom_regions().count());
    println!("  Cut regions: {}", cuts.len());
    if let Some(duration) = p.video_duration() {
        println!(
            "  Duration: {duration:.2}s ({:.2}s after cuts)",
            edited_duration(duration, &cuts)
        );
        println!(
            "  Exported frames: {} @ {}fps",
            exported_frame_count(duration, p.export.fps, &cuts),
            p.export.fps
        );
    }
    println!();

    println!("Export config:");
    println!("  Format: {:?}", p.export.format);
    println!(
        "  Output: {}x{} @ {}fps",
        p.export.width, p.export.height, p.export.fps
    );

    Ok(())
}
