//! Decoding and encoding of still images.
//!
//! Backgrounds are decoded here, before rendering starts, so the compositor
//! only ever sees ready bitmaps.

use std::path::{Path, PathBuf};

use tiny_skia::{IntSize, Pixmap};

use reframe_common::config::AppConfig;
use reframe_common::error::{ReframeError, ReframeResult};
use reframe_project_model::{Background, LoadedProject};

use crate::compositor::frame_to_rgba;

/// Extensions tried when a wallpaper is named without one.
const WALLPAPER_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Build a pixmap from straight-alpha RGBA bytes.
pub fn pixmap_from_rgba(width: u32, height: u32, mut rgba: Vec<u8>) -> ReframeResult<Pixmap> {
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(ReframeError::render(format!(
            "Frame size mismatch: expected {expected} bytes ({width}x{height}x4), got {}",
            rgba.len()
        )));
    }

    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a < 255 {
            for c in &mut px[..3] {
                *c = ((*c as u16 * a + 127) / 255) as u8;
            }
        }
    }

    let size = IntSize::from_wh(width, height)
        .ok_or_else(|| ReframeError::render(format!("Invalid image size {width}x{height}")))?;
    Pixmap::from_vec(rgba, size)
        .ok_or_else(|| ReframeError::render("Failed to wrap decoded pixels"))
}

/// Decode an image file into a pixmap.
pub fn load_image(path: &Path) -> ReframeResult<Pixmap> {
    if !path.exists() {
        return Err(ReframeError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let decoded = image::open(path)
        .map_err(|e| ReframeError::render(format!("Failed to decode {}: {e}", path.display())))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    tracing::debug!(path = %path.display(), width, height, "Decoded image");
    pixmap_from_rgba(width, height, decoded.into_raw())
}

/// Write a pixmap as a PNG.
pub fn save_png(pixmap: &Pixmap, path: &Path) -> ReframeResult<()> {
    let image = image::RgbaImage::from_raw(pixmap.width(), pixmap.height(), frame_to_rgba(pixmap))
        .ok_or_else(|| ReframeError::render("Frame buffer does not match its dimensions"))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| ReframeError::render(format!("Failed to write {}: {e}", path.display())))
}

/// Where the bitmap for an image or wallpaper background lives.
pub fn background_path(
    background: &Background,
    project: &LoadedProject,
    config: &AppConfig,
) -> Option<PathBuf> {
    match background {
        Background::Image { path } => Some(project.resolve(path)),
        Background::Wallpaper { name } => {
            let direct = config.wallpapers_dir.join(name);
            if direct.extension().is_some() {
                return Some(direct);
            }
            WALLPAPER_EXTENSIONS
                .iter()
                .map(|ext| direct.with_extension(ext))
                .find(|candidate| candidate.exists())
                .or(Some(direct))
        }
        _ => None,
    }
}

/// Decode the project's background bitmap, if its background needs one.
pub fn load_background(
    project: &LoadedProject,
    config: &AppConfig,
) -> ReframeResult<Option<Pixmap>> {
    match background_path(&project.project.frame.background, project, config) {
        Some(path) => load_image(&path).map(Some),
        None => Ok(None),
    }
}
