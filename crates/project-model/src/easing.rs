//! Easing curves for zoom transitions.
//!
//! Every curve maps normalized time `t ∈ [0, 1]` to eased progress with
//! `f(0) = 0` and `f(1) = 1`. The elastic curve overshoots past 1 before
//! settling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named easing curve stored on a zoom region.
///
/// The serialized keys are part of the project file format. An unknown key
/// fails deserialization instead of falling back to a default curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Easing {
    #[default]
    #[serde(rename = "easeInOutCubic")]
    EaseInOutCubic,
    #[serde(rename = "easeInOutCirc")]
    EaseInOutCirc,
    #[serde(rename = "easeInOutQuad")]
    EaseInOutQuad,
    #[serde(rename = "easeInOutQuart")]
    EaseInOutQuart,
    #[serde(rename = "easeInOutQuint")]
    EaseInOutQuint,
    #[serde(rename = "easeOutElastic")]
    EaseOutElastic,
}

impl Easing {
    /// Every supported curve.
    pub const ALL: [Easing; 6] = [
        Easing::EaseInOutCubic,
        Easing::EaseInOutCirc,
        Easing::EaseInOutQuad,
        Easing::EaseInOutQuart,
        Easing::EaseInOutQuint,
        Easing::EaseOutElastic,
    ];

    /// Evaluate the curve. `t` is clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::EaseInOutCubic => ease_in_out_cubic(t),
            Easing::EaseInOutCirc => ease_in_out_circ(t),
            Easing::EaseInOutQuad => ease_in_out_quad(t),
            Easing::EaseInOutQuart => ease_in_out_quart(t),
            Easing::EaseInOutQuint => ease_in_out_quint(t),
            Easing::EaseOutElastic => ease_out_elastic(t),
        }
    }

    /// The serialized key of this curve.
    pub fn key(self) -> &'static str {
        match self {
            Easing::EaseInOutCubic => "easeInOutCubic",
            Easing::EaseInOutCirc => "easeInOutCirc",
            Easing::EaseInOutQuad => "easeInOutQuad",
            Easing::EaseInOutQuart => "easeInOutQuart",
            Easing::EaseInOutQuint => "easeInOutQuint",
            Easing::EaseOutElastic => "easeOutElastic",
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Returned when parsing an easing key that has no curve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown easing `{0}`")]
pub struct UnknownEasing(pub String);

impl FromStr for Easing {
    type Err = UnknownEasing;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Easing::ALL
            .into_iter()
            .find(|easing| easing.key() == s)
            .ok_or_else(|| UnknownEasing(s.to_string()))
    }
}

pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

pub fn ease_in_out_circ(t: f64) -> f64 {
    if t < 0.5 {
        (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
    } else {
        ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
    }
}

pub fn ease_in_out_quad(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

pub fn ease_in_out_quart(t: f64) -> f64 {
    if t < 0.5 {
        8.0 * t.powi(4)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
    }
}

pub fn ease_in_out_quint(t: f64) -> f64 {
    if t < 0.5 {
        16.0 * t.powi(5)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
    }
}

/// Elastic ease-out.
///
/// The classic curve stops `2^-10 * sin(9.25 * C4)` short of 1 as `t -> 1`;
/// that residual is blended out linearly so the curve meets 1 without a jump.
pub fn ease_out_elastic(t: f64) -> f64 {
    const C4: f64 = (2.0 * std::f64::consts::PI) / 3.0;
    let curve = |t: f64| 2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * C4).sin() + 1.0;
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        curve(t) - t * (curve(1.0) - 1.0)
    }
}
