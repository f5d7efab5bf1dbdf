//! Background fill behind the frame.

use tiny_skia::{
    Color, FilterQuality, GradientStop, LinearGradient, Paint, Pattern, Pixmap, Point,
    RadialGradient, Rect, Shader, SpreadMode, Transform,
};

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_project_model::{Background, GradientDirection, Size};

use crate::color::parse_color;
use crate::layout::cover_crop;

/// Fill used when an image background has no decoded bitmap.
const MISSING_IMAGE_FILL: Color = Color::BLACK;

/// Fill the whole surface with `background`.
///
/// Image and wallpaper backgrounds draw `bitmap` cover-fitted. The
/// compositor never loads assets itself; a missing bitmap draws a plain
/// fill instead.
pub fn draw_background(
    surface: &mut Pixmap,
    background: &Background,
    bitmap: Option<&Pixmap>,
) -> ReframeResult<()> {
    let width = surface.width() as f32;
    let height = surface.height() as f32;
    let full = Rect::from_xywh(0.0, 0.0, width, height)
        .ok_or_else(|| ReframeError::render("Output surface has no area"))?;

    match background {
        Background::Color { color } => {
            surface.fill(parse_color(color)?);
        }
        Background::LinearGradient {
            direction,
            from,
            to,
        } => {
            let from = parse_color(from)?;
            let to = parse_color(to)?;
            let (start, end) = gradient_line(*direction, width, height);
            let shader = LinearGradient::new(
                start,
                end,
                vec![GradientStop::new(0.0, from), GradientStop::new(1.0, to)],
                SpreadMode::Pad,
                Transform::identity(),
            );
            fill_with(surface, full, shader, from);
        }
        Background::RadialGradient { from, to } => {
            let from = parse_color(from)?;
            let to = parse_color(to)?;
            let center = Point::from_xy(width / 2.0, height / 2.0);
            // Reaches the farthest corner.
            let radius = (width * width + height * height).sqrt() / 2.0;
            let shader = RadialGradient::new(
                center,
                center,
                radius,
                vec![GradientStop::new(0.0, from), GradientStop::new(1.0, to)],
                SpreadMode::Pad,
                Transform::identity(),
            );
            fill_with(surface, full, shader, from);
        }
        Background::Image { .. } | Background::Wallpaper { .. } => match bitmap {
            Some(bitmap) => draw_cover(surface, full, bitmap),
            None => {
                tracing::debug!("Image background without a bitmap; using plain fill");
                surface.fill(MISSING_IMAGE_FILL);
            }
        },
    }
    Ok(())
}

/// Start and end of a linear gradient across a `width` x `height` surface.
pub fn gradient_line(direction: GradientDirection, width: f32, height: f32) -> (Point, Point) {
    let (x0, y0, x1, y1) = direction.endpoints();
    (
        Point::from_xy(x0 as f32 * width, y0 as f32 * height),
        Point::from_xy(x1 as f32 * width, y1 as f32 * height),
    )
}

fn fill_with(surface: &mut Pixmap, rect: Rect, shader: Option<Shader>, fallback: Color) {
    let mut paint = Paint::default();
    match shader {
        Some(shader) => paint.shader = shader,
        None => paint.set_color(fallback),
    }
    surface.fill_rect(rect, &paint, Transform::identity(), None);
}

/// Draw `bitmap` so it covers `dest`, cropping the overflowing axis.
fn draw_cover(surface: &mut Pixmap, dest: Rect, bitmap: &Pixmap) {
    let transform = cover_transform(
        Size::new(bitmap.width() as f64, bitmap.height() as f64),
        dest,
    );
    let mut paint = Paint::default();
    paint.shader = Pattern::new(
        bitmap.as_ref(),
        SpreadMode::Pad,
        FilterQuality::Bilinear,
        1.0,
        transform,
    );
    surface.fill_rect(dest, &paint, Transform::identity(), None);
}

/// Transform from source pixels to output pixels that cover-fits a source
/// of `source` size into `dest`.
pub fn cover_transform(source: Size, dest: Rect) -> Transform {
    let dest_size = Size::new(dest.width() as f64, dest.height() as f64);
    let crop = cover_crop(source, dest_size);
    let scale_x = dest.width() as f64 / crop.width.max(f64::EPSILON);
    let scale_y = dest.height() as f64 / crop.height.max(f64::EPSILON);
    Transform::from_row(
        scale_x as f32,
        0.0,
        0.0,
        scale_y as f32,
        (dest.x() as f64 - crop.x * scale_x) as f32,
        (dest.y() as f64 - crop.y * scale_y) as f32,
    )
}
