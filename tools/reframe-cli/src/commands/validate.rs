//! Validate a Reframe project bundle.

use std::path::PathBuf;

use super::load_project;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating project at: {}", path.display());

    // Loading already rejects malformed regions and unknown easings.
    let project = load_project(&path)?;

    println!("  Name: {}", project.project.name);
    println!("  Version: {}", project.project.version);
    println!(
        "  Capture area: {}x{}",
        project.project.recording.width, project.project.recording.height
    );
    println!("  Regions: {}", project.timeline.len());

    let mut errors = project.validate_sources();
    let metadata_present = project
        .project
        .sources
        .metadata
        .as_ref()
        .is_some_and(|m| project.resolve(m).exists());
    if metadata_present {
        match project.load_mouse_track() {
            Ok(track) if track.was_resorted() => {
                println!("  Mouse metadata: {} events (out of order, re-sorted)", track.len())
            }
            Ok(track) => println!("  Mouse metadata: {} events", track.len()),
            Err(e) => errors.push(e.to_string()),
        }
    }

    if errors.is_empty() {
        println!("  Sources: All present");
        println!("\nProject is valid.");
        return Ok(());
    }

    println!("\nValidation issues:");
    for error in &errors {
        println!("  - {error}");
    }
    anyhow::bail!("{} issue(s) found", errors.len())
}
