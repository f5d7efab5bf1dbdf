//! Soft drop shadows.
//!
//! The rasterizer has no blur filter, so a shadow is drawn as a solid shape
//! into its own small layer, blurred with `image`'s box-blur approximation
//! of a gaussian and composited back.

use image::{imageops, RgbaImage};
use tiny_skia::{Color, FillRule, Paint, Path, Pixmap, PixmapPaint, Transform};

use reframe_common::error::{ReframeError, ReframeResult};

/// Gaussian tail kept around the shape, in sigmas.
const TAIL_SIGMAS: f64 = 3.0;

/// Draw a blurred shadow of `path` (in output coordinates) onto `surface`.
///
/// `blur` follows the canvas convention: the gaussian sigma is `blur / 2`.
pub fn draw_shadow(
    surface: &mut Pixmap,
    path: &Path,
    blur: f64,
    color: Color,
) -> ReframeResult<()> {
    if !(blur.is_finite() && blur > 0.0) || color.alpha() <= 0.0 {
        return Ok(());
    }

    let sigma = blur / 2.0;
    let margin = (sigma * TAIL_SIGMAS).ceil() as f32 + 1.0;
    let bounds = path.bounds();

    let left = (bounds.left() - margin).floor().max(0.0);
    let top = (bounds.top() - margin).floor().max(0.0);
    let right = (bounds.right() + margin).ceil().min(surface.width() as f32);
    let bottom = (bounds.bottom() + margin).ceil().min(surface.height() as f32);
    if right <= left || bottom <= top {
        return Ok(());
    }

    let mut layer = Pixmap::new((right - left) as u32, (bottom - top) as u32)
        .ok_or_else(|| ReframeError::render("Failed to allocate shadow layer"))?;

    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    layer.fill_path(
        path,
        &paint,
        FillRule::Winding,
        Transform::from_translate(-left, -top),
        None,
    );

    blur_layer(&mut layer, sigma as f32)?;

    surface.draw_pixmap(
        left as i32,
        top as i32,
        layer.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    Ok(())
}

/// Blur a layer in place. The blur is linear, so it runs directly on the
/// premultiplied bytes and the result stays premultiplied.
fn blur_layer(layer: &mut Pixmap, sigma: f32) -> ReframeResult<()> {
    let buffer = RgbaImage::from_raw(layer.width(), layer.height(), layer.data().to_vec())
        .ok_or_else(|| ReframeError::render("Shadow layer does not match its dimensions"))?;
    let blurred = imageops::fast_blur(&buffer, sigma);
    layer.data_mut().copy_from_slice(blurred.as_raw());
    Ok(())
}
