//! Geometry types shared by the transform engine and the compositor.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of a video, frame, or output surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Width over height. Returns 1.0 for degenerate sizes.
    pub fn aspect_ratio(&self) -> f64 {
        if self.is_valid() {
            self.width / self.height
        } else {
            1.0
        }
    }

    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f64, height as f64)
    }
}

/// An axis-aligned rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Shrink the rectangle by `amount` on every side. Never goes negative.
    pub fn inset(&self, amount: f64) -> Rect {
        let amount = amount.max(0.0);
        let width = (self.width - 2.0 * amount).max(0.0);
        let height = (self.height - 2.0 * amount).max(0.0);
        Rect::new(
            self.x + (self.width - width) / 2.0,
            self.y + (self.height - height) / 2.0,
            width,
            height,
        )
    }
}

/// The originally captured screen region, in physical pixels.
///
/// Recorded mouse coordinates are relative to `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordingGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RecordingGeometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Map a recorded mouse position into the `[-0.5, 0.5]` target space
    /// where `(0, 0)` is the centre of the capture area.
    ///
    /// Returns `None` when the geometry has no usable extent.
    pub fn normalize(&self, x: f64, y: f64) -> Option<Point2D> {
        if !self.size().is_valid() || !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some(Point2D::new(
            (x / self.width - 0.5).clamp(-0.5, 0.5),
            (y / self.height - 0.5).clamp(-0.5, 0.5),
        ))
    }
}

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}
