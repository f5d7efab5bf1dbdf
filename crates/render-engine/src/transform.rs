//! Explicit affine composition for the content transform.
//!
//! The zoomed frame content is placed by a fixed sequence of steps:
//!
//! ```text
//! translate to frame origin → translate to zoom origin → scale
//!     → translate by pan → translate back by -zoom origin
//! ```
//!
//! Each step is a [`TransformStep`] value and the composed matrix is a
//! [`PlaneTransform`], so the order can be inspected and tested directly.
//! Steps compose like a canvas transform stack: the first step is the
//! outermost, applied to a point last.

use reframe_processing_core::ZoomTransform;
use reframe_project_model::Rect;

/// A 3x3 homogeneous plane transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneTransform {
    pub m: [[f64; 3]; 3],
}

impl PlaneTransform {
    pub fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub fn from_affine(scale_x: f64, scale_y: f64, tx: f64, ty: f64) -> Self {
        Self {
            m: [[scale_x, 0.0, tx], [0.0, scale_y, ty], [0.0, 0.0, 1.0]],
        }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::from_affine(1.0, 1.0, tx, ty)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::from_affine(sx, sy, 0.0, 0.0)
    }

    /// `self * other`: `other` is applied to a point first.
    pub fn then(&self, other: &PlaneTransform) -> Self {
        let mut m = [[0.0; 3]; 3];
        for (r, row) in m.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.m[r][k] * other.m[k][c]).sum();
            }
        }
        Self { m }
    }

    /// Map a point. `None` when the point goes to infinity.
    pub fn project(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let xh = self.m[0][0] * x + self.m[0][1] * y + self.m[0][2];
        let yh = self.m[1][0] * x + self.m[1][1] * y + self.m[1][2];
        let wh = self.m[2][0] * x + self.m[2][1] * y + self.m[2][2];
        if wh.abs() < 1e-9 {
            return None;
        }
        Some((xh / wh, yh / wh))
    }

    /// Whether the bottom row is `[0, 0, 1]`.
    pub fn is_affine(&self) -> bool {
        self.m[2] == [0.0, 0.0, 1.0]
    }

    /// Convert to the rasterizer's transform. Projective terms are dropped,
    /// which is exact for every matrix built from [`TransformStep`]s.
    pub fn to_skia(&self) -> tiny_skia::Transform {
        let m = &self.m;
        tiny_skia::Transform::from_row(
            m[0][0] as f32,
            m[1][0] as f32,
            m[0][1] as f32,
            m[1][1] as f32,
            m[0][2] as f32,
            m[1][2] as f32,
        )
    }
}

impl Default for PlaneTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// One named step of the content transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformStep {
    /// Move to the frame's top-left corner in output pixels.
    TranslateToFrame { x: f64, y: f64 },
    /// Move to the zoom origin in frame-content pixels.
    TranslateToOrigin { x: f64, y: f64 },
    Scale(f64),
    /// Pan in frame-content pixels, inside the scaled space.
    Pan { x: f64, y: f64 },
    /// Undo [`TransformStep::TranslateToOrigin`].
    TranslateFromOrigin { x: f64, y: f64 },
}

impl TransformStep {
    pub fn matrix(&self) -> PlaneTransform {
        match *self {
            TransformStep::TranslateToFrame { x, y } => PlaneTransform::translate(x, y),
            TransformStep::TranslateToOrigin { x, y } => PlaneTransform::translate(x, y),
            TransformStep::Scale(s) => PlaneTransform::scale(s, s),
            TransformStep::Pan { x, y } => PlaneTransform::translate(x, y),
            TransformStep::TranslateFromOrigin { x, y } => PlaneTransform::translate(-x, -y),
        }
    }
}

/// The ordered steps that place frame content for `zoom` inside `frame`.
pub fn content_steps(frame: &Rect, zoom: &ZoomTransform) -> [TransformStep; 5] {
    let origin_x = zoom.origin_x * frame.width;
    let origin_y = zoom.origin_y * frame.height;
    [
        TransformStep::TranslateToFrame {
            x: frame.x,
            y: frame.y,
        },
        TransformStep::TranslateToOrigin {
            x: origin_x,
            y: origin_y,
        },
        TransformStep::Scale(zoom.scale),
        TransformStep::Pan {
            x: zoom.translate_x,
            y: zoom.translate_y,
        },
        TransformStep::TranslateFromOrigin {
            x: origin_x,
            y: origin_y,
        },
    ]
}

/// Compose steps in stack order.
pub fn compose(steps: &[TransformStep]) -> PlaneTransform {
    steps
        .iter()
        .fold(PlaneTransform::identity(), |acc, step| acc.then(&step.matrix()))
}

/// Matrix mapping frame-local content coordinates to output pixels.
pub fn content_transform(frame: &Rect, zoom: &ZoomTransform) -> PlaneTransform {
    compose(&content_steps(frame, zoom))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_identity_zoom_only_moves_to_frame() {
        let frame = Rect::new(100.0, 50.0, 800.0, 450.0);
        let m = content_transform(&frame, &ZoomTransform::IDENTITY);
        assert!(close(m.project(0.0, 0.0).unwrap(), (100.0, 50.0)));
        assert!(close(m.project(800.0, 450.0).unwrap(), (900.0, 500.0)));
    }

    #[test]
    fn test_origin_is_a_fixed_point_of_the_zoom() {
        let frame = Rect::new(0.0, 0.0, 1000.0, 600.0);
        let zoom = ZoomTransform {
            scale: 2.0,
            translate_x: 0.0,
            translate_y: 0.0,
            origin_x: 1.0,
            origin_y: 0.5,
        };
        let m = content_transform(&frame, &zoom);
        assert!(close(m.project(1000.0, 300.0).unwrap(), (1000.0, 300.0)));
        assert!(close(m.project(500.0, 300.0).unwrap(), (0.0, 300.0)));
    }

    #[test]
    fn test_pan_is_applied_inside_the_scaled_space() {
        let frame = Rect::new(0.0, 0.0, 1000.0, 600.0);
        let zoom = ZoomTransform {
            scale: 2.0,
            translate_x: -100.0,
            translate_y: 25.0,
            origin_x: 0.5,
            origin_y: 0.5,
        };
        let m = content_transform(&frame, &zoom);
        // The pan is doubled by the scale that follows it.
        assert!(close(m.project(500.0, 300.0).unwrap(), (300.0, 350.0)));
    }

    #[test]
    fn test_step_order_matters() {
        let frame = Rect::new(10.0, 10.0, 100.0, 100.0);
        let zoom = ZoomTransform {
            scale: 3.0,
            translate_x: 5.0,
            translate_y: 0.0,
            origin_x: 0.25,
            origin_y: 0.75,
        };
        let steps = content_steps(&frame, &zoom);
        let mut swapped = steps;
        swapped.swap(2, 3);
        assert_ne!(compose(&steps), compose(&swapped));
        assert!(matches!(steps[0], TransformStep::TranslateToFrame { .. }));
        assert!(matches!(steps[4], TransformStep::TranslateFromOrigin { .. }));
    }

    #[test]
    fn test_skia_conversion_maps_points_the_same_way() {
        let frame = Rect::new(40.0, 30.0, 640.0, 360.0);
        let zoom = ZoomTransform {
            scale: 1.5,
            translate_x: -20.0,
            translate_y: 12.0,
            origin_x: 0.3,
            origin_y: 0.6,
        };
        let m = content_transform(&frame, &zoom);
        assert!(m.is_affine());

        let mut p = [tiny_skia::Point::from_xy(123.0, 45.0)];
        m.to_skia().map_points(&mut p);
        let (x, y) = m.project(123.0, 45.0).unwrap();
        assert!((p[0].x as f64 - x).abs() < 1e-3);
        assert!((p[0].y as f64 - y).abs() < 1e-3);
    }
}
