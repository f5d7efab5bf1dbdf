//! Generate zoom regions from clusters of mouse clicks.

use std::path::PathBuf;

use reframe_processing_core::auto_zoom::{AutoZoomAnalyzer, AutoZoomConfig};
use reframe_project_model::ZoomMode;

use super::{load_project, probe_sources, save_project};

pub fn run(
    path: PathBuf,
    cluster_gap: f64,
    zoom_level: f64,
    replace: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    println!("Analyzing project at: {}", path.display());

    let mut project = load_project(&path)?;
    probe_sources(&mut project);

    let mouse = project
        .load_mouse_track()
        .map_err(|e| anyhow::anyhow!("Failed to load mouse metadata: {e}"))?;
    println!("  Loaded {} mouse events", mouse.len());
    if mouse.is_empty() {
        println!("  No events to analyze.");
        return Ok(());
    }

    let analyzer = AutoZoomAnalyzer::new(AutoZoomConfig {
        cluster_gap_secs: cluster_gap,
        zoom_level,
        ..Default::default()
    });
    let clusters = analyzer.cluster_clicks(&mouse);
    println!("  Found {} click clusters", clusters.len());

    let mut editor = project.editor();
    if replace {
        let stale: Vec<_> = editor
            .timeline()
            .zoom_regions()
            .filter(|z| z.mode == ZoomMode::Auto)
            .map(|z| z.id)
            .collect();
        for id in &stale {
            editor.delete_region(*id);
        }
        println!("  Removed {} auto zoom regions", stale.len());
    }

    let ids = analyzer
        .populate(&mut editor, &mouse, &project.project.recording)
        .map_err(|e| anyhow::anyhow!("Generated an invalid region: {e}"))?;

    for id in &ids {
        if let Some(z) = editor.timeline().zoom_region(*id) {
            println!(
                "  + {id}: {:.2}s - {:.2}s, level {:.1}, target ({:+.2}, {:+.2})",
                z.start_time,
                z.start_time + z.duration,
                z.zoom_level,
                z.target_x,
                z.target_y
            );
        }
    }

    if dry_run {
        println!("\nDry run: {} region(s) not saved.", ids.len());
        return Ok(());
    }

    project.timeline = editor.into_timeline();
    save_project(&mut project)?;
    println!(
        "  Timeline saved to: {}",
        path.join("meta/timeline.json").display()
    );
    println!("\nAnalysis complete: {} region(s) added.", ids.len());

    Ok(())
}
