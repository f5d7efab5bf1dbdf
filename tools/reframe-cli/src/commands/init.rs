//! Initialize a new Reframe project.

use std::path::{Path, PathBuf};

use reframe_project_model::{LoadedProject, TrackRef};

use super::{probe_sources, save_project};

pub struct InitArgs {
    pub name: String,
    pub output: PathBuf,
    pub screen: Option<PathBuf>,
    pub webcam: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Copy `file` into `<project>/sources/` and return the project-relative path.
fn import(project: &LoadedProject, file: &Path) -> anyhow::Result<String> {
    let file_name = file
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Not a file: {}", file.display()))?;
    let relative = Path::new("sources").join(file_name);
    std::fs::copy(file, project.root.join(&relative))
        .map_err(|e| anyhow::anyhow!("Failed to copy {}: {e}", file.display()))?;
    Ok(relative.to_string_lossy().into_owned())
}

pub fn run(args: InitArgs) -> anyhow::Result<()> {
    let project_dir = args.output.join(&args.name);
    println!("Creating project '{}' at {}", args.name, project_dir.display());

    let mut project =
        LoadedProject::create(&project_dir, &args.name, args.width, args.height, args.fps)
            .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    if let Some(screen) = &args.screen {
        project.project.sources.screen = Some(TrackRef::new(import(&project, screen)?));
    }
    if let Some(webcam) = &args.webcam {
        project.project.sources.webcam = Some(TrackRef::new(import(&project, webcam)?));
    }
    if let Some(metadata) = &args.metadata {
        project.project.sources.metadata = Some(import(&project, metadata)?);
    }
    probe_sources(&mut project);
    save_project(&mut project)?;

    println!("Project created successfully:");
    println!("  Directory: {}", project.root.display());
    println!("  Capture: {}x{}", args.width, args.height);
    println!("  Export FPS: {}", args.fps);
    if let Some(duration) = project.project.video_duration() {
        println!("  Duration: {duration:.2}s");
    }
    println!();
    println!("Directory structure:");
    println!("  {}/", args.name);
    println!("  ├── sources/     (screen, webcam, mouse metadata)");
    println!("  ├── meta/        (project.json, timeline.json)");
    println!("  └── exports/     (rendered output)");

    Ok(())
}
