//! Check external tools and configuration.

use reframe_common::config::{config_file_path, AppConfig};
use reframe_render_engine::ffmpeg::command_exists;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Reframe System Check");
    println!("{}", "=".repeat(50));

    let mut ready = true;
    for (binary, purpose) in [("ffmpeg", "decoding and encoding"), ("ffprobe", "probing sources")] {
        if command_exists(binary) {
            println!("[OK] {binary} ({purpose})");
        } else {
            println!("[MISSING] {binary} ({purpose})");
            ready = false;
        }
    }

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[INFO] Config: defaults ({} not found)", config_path.display());
    }

    if config.wallpapers_dir.is_dir() {
        println!("[OK] Wallpapers: {}", config.wallpapers_dir.display());
    } else {
        println!(
            "[WARN] Wallpapers: {} does not exist",
            config.wallpapers_dir.display()
        );
    }

    println!();
    if ready {
        println!("All required tools are available. Reframe is ready.");
    } else {
        println!("Install ffmpeg to render and export projects.");
    }

    Ok(())
}
