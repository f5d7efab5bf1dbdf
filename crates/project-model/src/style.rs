//! Presentation settings for the composited frame and webcam overlay.
//!
//! Colors are stored as CSS-style strings (`#rrggbb`, `rgba(...)`) and parsed
//! by the renderer.

use serde::{Deserialize, Serialize};

/// Direction of a linear background gradient, named by where it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GradientDirection {
    ToTop,
    ToTopRight,
    ToRight,
    #[default]
    ToBottomRight,
    ToBottom,
    ToBottomLeft,
    ToLeft,
    ToTopLeft,
}

impl GradientDirection {
    /// Unit-square start and end points `(x0, y0, x1, y1)`.
    pub fn endpoints(self) -> (f64, f64, f64, f64) {
        match self {
            GradientDirection::ToTop => (0.5, 1.0, 0.5, 0.0),
            GradientDirection::ToTopRight => (0.0, 1.0, 1.0, 0.0),
            GradientDirection::ToRight => (0.0, 0.5, 1.0, 0.5),
            GradientDirection::ToBottomRight => (0.0, 0.0, 1.0, 1.0),
            GradientDirection::ToBottom => (0.5, 0.0, 0.5, 1.0),
            GradientDirection::ToBottomLeft => (1.0, 0.0, 0.0, 1.0),
            GradientDirection::ToLeft => (1.0, 0.5, 0.0, 0.5),
            GradientDirection::ToTopLeft => (1.0, 1.0, 0.0, 0.0),
        }
    }
}

/// What fills the output behind the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Background {
    Color {
        color: String,
    },
    LinearGradient {
        #[serde(default)]
        direction: GradientDirection,
        from: String,
        to: String,
    },
    RadialGradient {
        from: String,
        to: String,
    },
    /// A user image, path relative to the project root.
    Image {
        path: String,
    },
    /// A curated wallpaper by name, resolved against the wallpapers directory.
    Wallpaper {
        name: String,
    },
}

impl Default for Background {
    fn default() -> Self {
        Background::LinearGradient {
            direction: GradientDirection::ToBottomRight,
            from: "#4f46e5".to_string(),
            to: "#db2777".to_string(),
        }
    }
}

impl Background {
    /// Whether a decoded bitmap must be supplied to draw this background.
    pub fn needs_bitmap(&self) -> bool {
        matches!(self, Background::Image { .. } | Background::Wallpaper { .. })
    }
}

/// Blurred drop shadow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowStyle {
    /// Blur radius in output pixels; `0` disables the shadow.
    pub blur: f64,
    pub color: String,
}

impl Default for ShadowStyle {
    fn default() -> Self {
        Self {
            blur: 40.0,
            color: "rgba(0, 0, 0, 0.45)".to_string(),
        }
    }
}

impl ShadowStyle {
    pub fn is_visible(&self) -> bool {
        self.blur.is_finite() && self.blur > 0.0
    }
}

/// Styling of the frame that holds the screen recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameStyles {
    /// Padding per side as a percentage of the output dimension.
    pub padding: f64,
    pub background: Background,
    /// Outer corner radius in output pixels.
    pub border_radius: f64,
    /// Glass border thickness in output pixels.
    pub border_width: f64,
    pub shadow: ShadowStyle,
}

impl Default for FrameStyles {
    fn default() -> Self {
        Self {
            padding: 8.0,
            background: Background::default(),
            border_radius: 16.0,
            border_width: 6.0,
            shadow: ShadowStyle::default(),
        }
    }
}

/// Corner the webcam overlay sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WebcamPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

/// Styling of the webcam overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebcamStyles {
    pub visible: bool,
    /// Side length as a percentage of the smaller output dimension.
    pub size: f64,
    pub shadow: ShadowStyle,
    pub position: WebcamPosition,
}

impl Default for WebcamStyles {
    fn default() -> Self {
        Self {
            visible: true,
            size: 20.0,
            shadow: ShadowStyle {
                blur: 24.0,
                color: "rgba(0, 0, 0, 0.5)".to_string(),
            },
            position: WebcamPosition::BottomRight,
        }
    }
}
