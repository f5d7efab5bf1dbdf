//! Scene compositor.
//!
//! [`draw_scene`] renders one output frame in a fixed order: background,
//! frame shadow, glass frame fill, border stroke, video, webcam overlay.
//! The zoom scales the whole frame (shadow, chrome and video) about the
//! transform origin, so a zoomed frame may cover the padding. It performs no I/O; decoded frames and the background bitmap
//! are handed in by the caller. Preview and export both render through
//! [`FrameRenderer`], which wraps it.

use tiny_skia::{
    Color, FillRule, FilterQuality, GradientStop, LinearGradient, Paint, Path, PathBuilder,
    Pattern, Pixmap, Point, RadialGradient, SpreadMode, Stroke, Transform,
};

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_processing_core::calculate_zoom_transform;
use reframe_project_model::{
    CutRegion, FrameStyles, LoadedProject, MouseTrack, Rect, Size, WebcamStyles, ZoomRegion,
};

use crate::background::{cover_transform, draw_background};
use crate::color::parse_color;
use crate::layout::{frame_rect, webcam_rect, WEBCAM_CORNER_RADIUS};
use crate::shadow::draw_shadow;
use crate::source::MediaSources;
use crate::transform::{content_transform, PlaneTransform};

/// Cubic control distance for a quarter circle of radius 1.
const ARC_KAPPA: f32 = 0.552_284_8;

/// Glass fill alphas, top-left to bottom-right, plus the highlight.
const GLASS_FROM_ALPHA: u8 = 38;
const GLASS_TO_ALPHA: u8 = 13;
const GLASS_HIGHLIGHT_ALPHA: u8 = 26;
const BORDER_STROKE_ALPHA: u8 = 64;
const BORDER_STROKE_WIDTH: f32 = 1.0;

/// Everything the compositor needs besides the decoded frames.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Zoom regions in creation order; the first one covering a time wins.
    pub zoom_regions: Vec<ZoomRegion>,
    pub cut_regions: Vec<CutRegion>,
    pub mouse: MouseTrack,
    pub frame: FrameStyles,
    pub webcam: WebcamStyles,
    /// Native size of the screen recording. Mouse coordinates live in it.
    /// When invalid, the size of the video frame is used.
    pub video_size: Size,
}

impl Scene {
    /// Build a scene from a loaded project.
    pub fn from_project(loaded: &LoadedProject, mouse: MouseTrack, video_size: Size) -> Self {
        Self {
            zoom_regions: loaded.timeline.zoom_region_list(),
            cut_regions: loaded.timeline.cut_region_list(),
            mouse,
            frame: loaded.project.frame.clone(),
            webcam: loaded.project.webcam.clone(),
            video_size,
        }
    }
}

/// Render the scene at `time_secs` into `surface`.
#[allow(clippy::too_many_arguments)]
pub fn draw_scene(
    surface: &mut Pixmap,
    scene: &Scene,
    video_frame: &Pixmap,
    webcam_frame: Option<&Pixmap>,
    time_secs: f64,
    output_width: u32,
    output_height: u32,
    background_image: Option<&Pixmap>,
) -> ReframeResult<()> {
    if surface.width() != output_width || surface.height() != output_height {
        return Err(ReframeError::render(format!(
            "Surface is {}x{} but the output is {output_width}x{output_height}",
            surface.width(),
            surface.height()
        )));
    }
    let output = Size::new(output_width as f64, output_height as f64);
    let video_size = if scene.video_size.is_valid() {
        scene.video_size
    } else {
        Size::new(video_frame.width() as f64, video_frame.height() as f64)
    };

    // 1. Background.
    surface.fill(Color::TRANSPARENT);
    draw_background(surface, &scene.frame.background, background_image)?;

    // 2. Frame geometry.
    let frame = frame_rect(output, scene.frame.padding, video_size);
    let styles = &scene.frame;
    let radius = styles.border_radius.max(0.0);
    let border = styles.border_width.max(0.0);
    let local = Rect::new(0.0, 0.0, frame.width, frame.height);
    let inner = local.inset(border);

    // 3. Transform. Everything below the background lives in frame-local
    // coordinates and is mapped to the output through this matrix.
    let zoom = calculate_zoom_transform(
        time_secs,
        &scene.zoom_regions,
        &scene.mouse,
        video_size,
        frame.size(),
    );
    let content = content_transform(&frame, &zoom);
    let to_output = content.to_skia();

    // 4. Chrome and content.
    let Some(outer_path) =
        rounded_rect_path(&local, radius).and_then(|path| path.transform(to_output))
    else {
        return Ok(());
    };
    if styles.shadow.is_visible() {
        let color = parse_color(&styles.shadow.color)?;
        draw_shadow(surface, &outer_path, styles.shadow.blur, color)?;
    }
    draw_glass(surface, &outer_path, &local, to_output);
    stroke_border(surface, &outer_path);

    let inner_path = rounded_rect_path(&inner, (radius - border).max(0.0))
        .and_then(|path| path.transform(to_output));
    if let Some(inner_path) = inner_path {
        let place = PlaneTransform::from_affine(
            inner.width / video_frame.width() as f64,
            inner.height / video_frame.height() as f64,
            inner.x,
            inner.y,
        );
        fill_with_image(surface, &inner_path, video_frame, content.then(&place).to_skia());
    }

    // 5. Webcam overlay.
    match webcam_frame {
        Some(webcam) if scene.webcam.visible => {
            draw_webcam(surface, &scene.webcam, webcam, output)?;
        }
        _ => {}
    }

    tracing::trace!(
        time_secs,
        scale = zoom.scale,
        translate_x = zoom.translate_x,
        translate_y = zoom.translate_y,
        "Frame composed"
    );
    Ok(())
}

fn white(alpha: u8) -> Color {
    Color::from_rgba8(255, 255, 255, alpha)
}

/// `path` is in output space; `frame` is the frame-local rectangle that
/// `to_output` maps onto it.
fn draw_glass(surface: &mut Pixmap, path: &Path, frame: &Rect, to_output: Transform) {
    let mut paint = Paint::default();
    paint.anti_alias = true;

    let gradient = LinearGradient::new(
        Point::from_xy(frame.x as f32, frame.y as f32),
        Point::from_xy(frame.right() as f32, frame.bottom() as f32),
        vec![
            GradientStop::new(0.0, white(GLASS_FROM_ALPHA)),
            GradientStop::new(1.0, white(GLASS_TO_ALPHA)),
        ],
        SpreadMode::Pad,
        to_output,
    );
    match gradient {
        Some(shader) => paint.shader = shader,
        None => paint.set_color(white(GLASS_FROM_ALPHA)),
    }
    surface.fill_path(path, &paint, FillRule::Winding, Transform::identity(), None);

    let center = Point::from_xy(
        (frame.x + frame.width * 0.25) as f32,
        frame.y as f32,
    );
    let highlight = RadialGradient::new(
        center,
        center,
        (frame.width.max(frame.height) * 0.75) as f32,
        vec![
            GradientStop::new(0.0, white(GLASS_HIGHLIGHT_ALPHA)),
            GradientStop::new(1.0, Color::TRANSPARENT),
        ],
        SpreadMode::Pad,
        to_output,
    );
    if let Some(shader) = highlight {
        paint.shader = shader;
        surface.fill_path(path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

fn stroke_border(surface: &mut Pixmap, path: &Path) {
    let mut paint = Paint::default();
    paint.set_color(white(BORDER_STROKE_ALPHA));
    paint.anti_alias = true;
    let stroke = Stroke {
        width: BORDER_STROKE_WIDTH,
        ..Stroke::default()
    };
    surface.stroke_path(path, &paint, &stroke, Transform::identity(), None);
}

/// Fill `path` with `image` placed by `transform`. The path is the clip.
fn fill_with_image(surface: &mut Pixmap, path: &Path, image: &Pixmap, transform: Transform) {
    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.shader = Pattern::new(
        image.as_ref(),
        SpreadMode::Pad,
        FilterQuality::Bilinear,
        1.0,
        transform,
    );
    surface.fill_path(path, &paint, FillRule::Winding, Transform::identity(), None);
}

fn draw_webcam(
    surface: &mut Pixmap,
    styles: &WebcamStyles,
    webcam: &Pixmap,
    output: Size,
) -> ReframeResult<()> {
    let rect = webcam_rect(output, styles);
    let Some(path) = rounded_rect_path(&rect, rect.width * WEBCAM_CORNER_RADIUS) else {
        return Ok(());
    };

    // Shadow first, in its own pass, so it never tints the webcam pixels.
    if styles.shadow.is_visible() {
        let color = parse_color(&styles.shadow.color)?;
        draw_shadow(surface, &path, styles.shadow.blur, color)?;
    }

    let Some(dest) = tiny_skia::Rect::from_xywh(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
    ) else {
        return Ok(());
    };
    let transform = cover_transform(
        Size::new(webcam.width() as f64, webcam.height() as f64),
        dest,
    );
    fill_with_image(surface, &path, webcam, transform);
    Ok(())
}

/// A rounded rectangle. `None` when the rectangle has no area.
///
/// The radius is limited to half the shorter side.
pub fn rounded_rect_path(rect: &Rect, radius: f64) -> Option<Path> {
    if !(rect.width > 0.0 && rect.height > 0.0) {
        return None;
    }
    let x = rect.x as f32;
    let y = rect.y as f32;
    let w = rect.width as f32;
    let h = rect.height as f32;
    let r = (radius.max(0.0) as f32).min(w / 2.0).min(h / 2.0);

    if r <= 0.0 {
        return Some(PathBuilder::from_rect(tiny_skia::Rect::from_xywh(x, y, w, h)?));
    }

    let k = r * ARC_KAPPA;
    let (right, bottom) = (x + w, y + h);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Serialize a surface to straight-alpha RGBA, `width * height * 4` bytes,
/// row-major with no padding.
pub fn frame_to_rgba(surface: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(surface.data().len());
    for pixel in surface.pixels() {
        let c = pixel.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

/// Owns the output surface and renders scenes into it.
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    scene: Scene,
    background: Option<Pixmap>,
    surface: Pixmap,
}

impl FrameRenderer {
    pub fn new(
        scene: Scene,
        background: Option<Pixmap>,
        width: u32,
        height: u32,
    ) -> ReframeResult<Self> {
        let surface = Pixmap::new(width, height).ok_or_else(|| {
            ReframeError::render(format!("Invalid output size {width}x{height}"))
        })?;
        Ok(Self {
            scene,
            background,
            surface,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn set_scene(&mut self, scene: Scene) {
        self.scene = scene;
    }

    pub fn background(&self) -> Option<&Pixmap> {
        self.background.as_ref()
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    /// The last rendered frame.
    pub fn surface(&self) -> &Pixmap {
        &self.surface
    }

    /// Render explicit frames at `time_secs`.
    pub fn render(
        &mut self,
        time_secs: f64,
        video: &Pixmap,
        webcam: Option<&Pixmap>,
    ) -> ReframeResult<&Pixmap> {
        let (width, height) = (self.surface.width(), self.surface.height());
        draw_scene(
            &mut self.surface,
            &self.scene,
            video,
            webcam,
            time_secs,
            width,
            height,
            self.background.as_ref(),
        )?;
        Ok(&self.surface)
    }

    /// Render whatever `sources` currently present.
    pub fn render_sources(
        &mut self,
        time_secs: f64,
        sources: &MediaSources,
    ) -> ReframeResult<&Pixmap> {
        let video = sources.video.frame()?;
        let webcam = match &sources.webcam {
            Some(webcam) => Some(webcam.frame()?),
            None => None,
        };
        self.render(time_secs, video, webcam)
    }

    /// The last rendered frame as straight-alpha RGBA bytes.
    pub fn rgba(&self) -> Vec<u8> {
        frame_to_rgba(&self.surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_project_model::{Background, Easing, RegionId, ShadowStyle, ZoomMode};

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Pixmap {
        let mut pixmap = Pixmap::new(width, height).unwrap();
        pixmap.fill(Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
        pixmap
    }

    fn rgba_at(surface: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let c = surface.pixel(x, y).unwrap().demultiply();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    fn plain_scene() -> Scene {
        Scene {
            frame: FrameStyles {
                padding: 10.0,
                background: Background::Color {
                    color: "#0000ff".to_string(),
                },
                border_radius: 0.0,
                border_width: 0.0,
                shadow: ShadowStyle {
                    blur: 0.0,
                    ..ShadowStyle::default()
                },
            },
            webcam: WebcamStyles {
                shadow: ShadowStyle {
                    blur: 0.0,
                    ..ShadowStyle::default()
                },
                ..WebcamStyles::default()
            },
            video_size: Size::new(100.0, 100.0),
            ..Scene::default()
        }
    }

    #[test]
    fn test_background_padding_and_video_placement() {
        let scene = plain_scene();
        let video = solid(100, 100, [255, 0, 0, 255]);
        let mut surface = Pixmap::new(100, 100).unwrap();
        draw_scene(&mut surface, &scene, &video, None, 0.0, 100, 100, None).unwrap();

        assert_eq!(rgba_at(&surface, 2, 2), [0, 0, 255, 255]);
        let center = rgba_at(&surface, 50, 50);
        assert!(center[0] > 245 && center[2] < 10, "{center:?}");
    }

    fn centered_zoom(level: f64) -> ZoomRegion {
        ZoomRegion {
            id: RegionId(1),
            start_time: 0.0,
            duration: 4.0,
            zoom_level: level,
            easing: Easing::EaseInOutCubic,
            transition_duration: 1.0,
            target_x: 0.0,
            target_y: 0.0,
            mode: ZoomMode::Fixed,
            z_index: 0,
        }
    }

    #[test]
    fn test_zoomed_frame_covers_the_padding() {
        let mut scene = plain_scene();
        scene.zoom_regions = vec![centered_zoom(3.0)];
        let video = solid(100, 100, [255, 0, 0, 255]);
        let mut surface = Pixmap::new(100, 100).unwrap();
        draw_scene(&mut surface, &scene, &video, None, 2.0, 100, 100, None).unwrap();

        // The 80px frame at 10..90 scales about its center to -70..170.
        for (x, y) in [(3, 50), (96, 50), (50, 3), (1, 1)] {
            let px = rgba_at(&surface, x, y);
            assert!(px[0] > 245 && px[2] < 10, "({x},{y}) = {px:?}");
        }
    }

    #[test]
    fn test_frame_edges_move_with_the_zoom() {
        let mut scene = plain_scene();
        scene.zoom_regions = vec![centered_zoom(1.1)];
        let video = solid(100, 100, [255, 0, 0, 255]);
        let mut surface = Pixmap::new(100, 100).unwrap();

        // Unzoomed, the frame starts at x = 10.
        draw_scene(&mut surface, &scene, &video, None, 5.0, 100, 100, None).unwrap();
        assert_eq!(rgba_at(&surface, 8, 50), [0, 0, 255, 255]);

        // At 1.1x the frame spans 6..94.
        draw_scene(&mut surface, &scene, &video, None, 2.0, 100, 100, None).unwrap();
        assert!(rgba_at(&surface, 8, 50)[0] > 245);
        assert_eq!(rgba_at(&surface, 4, 50), [0, 0, 255, 255]);
        assert!(rgba_at(&surface, 92, 50)[0] > 245);
        assert_eq!(rgba_at(&surface, 96, 50), [0, 0, 255, 255]);
    }

    #[test]
    fn test_frame_shadow_follows_the_zoom() {
        let mut scene = plain_scene();
        scene.frame.padding = 25.0;
        scene.frame.shadow = ShadowStyle {
            blur: 8.0,
            color: "#000000".to_string(),
        };
        scene.zoom_regions = vec![centered_zoom(1.5)];
        let video = solid(100, 100, [255, 0, 0, 255]);
        let mut surface = Pixmap::new(200, 200).unwrap();

        // Unzoomed the frame spans 50..150 and x = 20 is plain background.
        draw_scene(&mut surface, &scene, &video, None, 5.0, 200, 200, None).unwrap();
        assert_eq!(rgba_at(&surface, 20, 100), [0, 0, 255, 255]);

        // At 1.5x the frame spans 25..175; its shadow darkens x = 20.
        draw_scene(&mut surface, &scene, &video, None, 2.0, 200, 200, None).unwrap();
        let px = rgba_at(&surface, 20, 100);
        assert!(px[2] < 250 && px[0] < 10, "{px:?}");
    }

    #[test]
    fn test_zoom_magnifies_about_the_origin() {
        // Video: left half red, right half green.
        let mut video = solid(100, 100, [255, 0, 0, 255]);
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 255, 0, 255);
        video.fill_rect(
            tiny_skia::Rect::from_xywh(50.0, 0.0, 50.0, 100.0).unwrap(),
            &paint,
            Transform::identity(),
            None,
        );

        let mut scene = plain_scene();
        scene.frame.padding = 0.0;
        scene.zoom_regions = vec![ZoomRegion {
            id: RegionId(1),
            start_time: 0.0,
            duration: 4.0,
            zoom_level: 2.0,
            easing: Easing::EaseInOutCubic,
            transition_duration: 1.0,
            target_x: -0.5,
            target_y: 0.0,
            mode: ZoomMode::Fixed,
            z_index: 0,
        }];
        let mut surface = Pixmap::new(100, 100).unwrap();

        // Origin snaps to the left edge, so the left (red) half fills the frame.
        draw_scene(&mut surface, &scene, &video, None, 2.0, 100, 100, None).unwrap();
        assert!(rgba_at(&surface, 90, 50)[0] > 245);

        draw_scene(&mut surface, &scene, &video, None, 5.0, 100, 100, None).unwrap();
        assert!(rgba_at(&surface, 90, 50)[1] > 245);
    }

    #[test]
    fn test_webcam_drawn_in_its_corner() {
        let scene = plain_scene();
        let video = solid(100, 100, [255, 0, 0, 255]);
        let webcam = solid(40, 30, [0, 255, 0, 255]);
        let mut surface = Pixmap::new(200, 200).unwrap();
        draw_scene(&mut surface, &scene, &video, Some(&webcam), 0.0, 200, 200, None).unwrap();

        // 20% of 200 = 40px square, 4px from the bottom-right corner.
        let inside = rgba_at(&surface, 190, 190);
        assert!(inside[1] > 245 && inside[0] < 10, "{inside:?}");
        // The rounded corner leaves the very corner pixel uncovered.
        assert_ne!(rgba_at(&surface, 156, 156), [0, 255, 0, 255]);
    }

    #[test]
    fn test_hidden_webcam_is_not_drawn() {
        let mut scene = plain_scene();
        scene.webcam.visible = false;
        let video = solid(100, 100, [255, 0, 0, 255]);
        let webcam = solid(10, 10, [0, 255, 0, 255]);
        let mut surface = Pixmap::new(200, 200).unwrap();
        draw_scene(&mut surface, &scene, &video, Some(&webcam), 0.0, 200, 200, None).unwrap();
        assert_eq!(rgba_at(&surface, 190, 190), [0, 0, 255, 255]);
    }

    #[test]
    fn test_surface_size_mismatch_is_an_error() {
        let scene = plain_scene();
        let video = solid(10, 10, [0, 0, 0, 255]);
        let mut surface = Pixmap::new(10, 10).unwrap();
        let err = draw_scene(&mut surface, &scene, &video, None, 0.0, 20, 10, None).unwrap_err();
        assert!(matches!(err, ReframeError::Render { .. }));
    }

    #[test]
    fn test_bad_shadow_color_is_reported() {
        let mut scene = plain_scene();
        scene.frame.shadow = ShadowStyle {
            blur: 10.0,
            color: "rgba(0,0,0)".to_string(),
        };
        let video = solid(10, 10, [0, 0, 0, 255]);
        let mut surface = Pixmap::new(50, 50).unwrap();
        assert!(draw_scene(&mut surface, &scene, &video, None, 0.0, 50, 50, None).is_err());
    }

    #[test]
    fn test_frame_to_rgba_layout_and_alpha() {
        let surface = solid(3, 2, [200, 100, 50, 128]);
        let bytes = frame_to_rgba(&surface);
        assert_eq!(bytes.len(), 3 * 2 * 4);
        for px in bytes.chunks_exact(4) {
            assert_eq!(px[3], 128);
            assert!((px[0] as i32 - 200).abs() <= 2);
            assert!((px[1] as i32 - 100).abs() <= 2);
        }
    }

    #[test]
    fn test_rounded_rect_radius_is_limited() {
        let rect = Rect::new(0.0, 0.0, 10.0, 40.0);
        let path = rounded_rect_path(&rect, 100.0).unwrap();
        let bounds = path.bounds();
        assert!((bounds.width() - 10.0).abs() < 1e-3);
        assert!((bounds.height() - 40.0).abs() < 1e-3);
        assert!(rounded_rect_path(&Rect::new(0.0, 0.0, 0.0, 5.0), 2.0).is_none());
    }

    #[test]
    fn test_renderer_matches_direct_draw() {
        let scene = plain_scene();
        let video = solid(100, 100, [10, 200, 30, 255]);
        let mut renderer = FrameRenderer::new(scene.clone(), None, 64, 48).unwrap();
        let rendered = renderer.render(1.0, &video, None).unwrap().clone();

        let mut surface = Pixmap::new(64, 48).unwrap();
        draw_scene(&mut surface, &scene, &video, None, 1.0, 64, 48, None).unwrap();
        assert_eq!(rendered.data(), surface.data());
    }
}
