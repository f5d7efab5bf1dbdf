//! Zoom and cut regions anchored to the timeline.
//!
//! A region occupies the half-open interval `[start_time, start_time + duration)`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Default peak zoom for new regions.
pub const DEFAULT_ZOOM_LEVEL: f64 = 2.0;
/// Default zoom region length in seconds.
pub const DEFAULT_ZOOM_DURATION_SECS: f64 = 3.0;
/// Default ease-in / ease-out length in seconds.
pub const DEFAULT_TRANSITION_SECS: f64 = 1.0;
/// Default cut region length in seconds.
pub const DEFAULT_CUT_DURATION_SECS: f64 = 2.0;

/// Stable identifier of a region within one timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region-{}", self.0)
    }
}

/// How the camera frames a zoom region's hold phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZoomMode {
    /// Pan follows recorded mouse movement.
    #[default]
    Auto,
    /// Focus point stays at the region target.
    Fixed,
}

/// Marks a cut anchored to one end of the timeline (a trim handle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimType {
    Start,
    End,
}

/// Which edge of a cut is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionEdge {
    Left,
    Right,
}

/// A timeline-anchored camera animation directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomRegion {
    pub id: RegionId,
    pub start_time: f64,
    pub duration: f64,
    pub zoom_level: f64,
    pub easing: Easing,
    pub transition_duration: f64,
    /// Normalized focus x in `[-0.5, 0.5]`, `0` is the frame centre.
    pub target_x: f64,
    /// Normalized focus y in `[-0.5, 0.5]`, `0` is the frame centre.
    pub target_y: f64,
    pub mode: ZoomMode,
    /// Derived from relative duration; never set by the user.
    #[serde(default)]
    pub z_index: u32,
}

/// A timeline-anchored removal directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutRegion {
    pub id: RegionId,
    pub start_time: f64,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_type: Option<TrimType>,
    #[serde(default)]
    pub z_index: u32,
}

/// Fields shared by both region kinds, for z-ordering and lookups.
pub trait TimelineSpan {
    fn id(&self) -> RegionId;
    fn start_time(&self) -> f64;
    fn duration(&self) -> f64;

    fn end_time(&self) -> f64 {
        self.start_time() + self.duration()
    }

    /// Half-open containment: `start <= t < end`.
    fn contains(&self, time_secs: f64) -> bool {
        time_secs >= self.start_time() && time_secs < self.end_time()
    }
}

impl TimelineSpan for ZoomRegion {
    fn id(&self) -> RegionId {
        self.id
    }
    fn start_time(&self) -> f64 {
        self.start_time
    }
    fn duration(&self) -> f64 {
        self.duration
    }
}

impl TimelineSpan for CutRegion {
    fn id(&self) -> RegionId {
        self.id
    }
    fn start_time(&self) -> f64 {
        self.start_time
    }
    fn duration(&self) -> f64 {
        self.duration
    }
}

impl ZoomRegion {
    /// Start of the zoom-out transition.
    pub fn zoom_out_start(&self) -> f64 {
        self.end_time() - self.transition_duration
    }

    /// Check numeric fields and normalize the ones with soft limits.
    ///
    /// Targets are clamped to `[-0.5, 0.5]` and the transition is clamped to
    /// half the duration so the ease-in and ease-out windows never overlap.
    pub fn validate(&mut self) -> Result<(), RegionError> {
        let id = self.id;
        check_finite(id, "start_time", self.start_time)?;
        check_finite(id, "duration", self.duration)?;
        check_finite(id, "zoom_level", self.zoom_level)?;
        check_finite(id, "transition_duration", self.transition_duration)?;
        check_finite(id, "target_x", self.target_x)?;
        check_finite(id, "target_y", self.target_y)?;

        if self.duration <= 0.0 {
            return Err(RegionError::InvalidDuration {
                id,
                duration: self.duration,
            });
        }
        if self.zoom_level < 1.0 {
            return Err(RegionError::InvalidZoomLevel {
                id,
                zoom_level: self.zoom_level,
            });
        }

        self.start_time = self.start_time.max(0.0);
        self.target_x = self.target_x.clamp(-0.5, 0.5);
        self.target_y = self.target_y.clamp(-0.5, 0.5);
        self.transition_duration = self.transition_duration.clamp(0.0, self.duration / 2.0);
        Ok(())
    }
}

impl CutRegion {
    pub fn validate(&mut self) -> Result<(), RegionError> {
        check_finite(self.id, "start_time", self.start_time)?;
        check_finite(self.id, "duration", self.duration)?;
        if self.duration <= 0.0 {
            return Err(RegionError::InvalidDuration {
                id: self.id,
                duration: self.duration,
            });
        }
        self.start_time = self.start_time.max(0.0);
        Ok(())
    }

    /// Whether the given edge may be dragged. Trim cuts are pinned to their
    /// end of the timeline.
    pub fn can_resize(&self, edge: RegionEdge) -> bool {
        !matches!(
            (self.trim_type, edge),
            (Some(TrimType::Start), RegionEdge::Left) | (Some(TrimType::End), RegionEdge::Right)
        )
    }

    /// Only untyped cuts can be moved.
    pub fn can_move(&self) -> bool {
        self.trim_type.is_none()
    }
}

fn check_finite(id: RegionId, field: &'static str, value: f64) -> Result<(), RegionError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RegionError::NonFinite { id, field, value })
    }
}

/// A partial update merged into an existing region.
///
/// Zoom-only fields are ignored when the target is a cut region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionPatch {
    pub start_time: Option<f64>,
    pub duration: Option<f64>,
    pub zoom_level: Option<f64>,
    pub easing: Option<Easing>,
    pub transition_duration: Option<f64>,
    pub target_x: Option<f64>,
    pub target_y: Option<f64>,
    pub mode: Option<ZoomMode>,
    pub trim_type: Option<TrimType>,
}

impl RegionPatch {
    pub fn with_start(mut self, start_time: f64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_trim(mut self, trim_type: TrimType) -> Self {
        self.trim_type = Some(trim_type);
        self
    }

    pub(crate) fn apply_to_zoom(&self, region: &mut ZoomRegion) {
        if let Some(v) = self.start_time {
            region.start_time = v;
        }
        if let Some(v) = self.duration {
            region.duration = v;
        }
        if let Some(v) = self.zoom_level {
            region.zoom_level = v;
        }
        if let Some(v) = self.easing {
            region.easing = v;
        }
        if let Some(v) = self.transition_duration {
            region.transition_duration = v;
        }
        if let Some(v) = self.target_x {
            region.target_x = v;
        }
        if let Some(v) = self.target_y {
            region.target_y = v;
        }
        if let Some(v) = self.mode {
            region.mode = v;
        }
    }

    pub(crate) fn apply_to_cut(&self, region: &mut CutRegion) {
        if let Some(v) = self.start_time {
            region.start_time = v;
        }
        if let Some(v) = self.duration {
            region.duration = v;
        }
        if self.trim_type.is_some() {
            region.trim_type = self.trim_type;
        }
    }
}

/// Errors raised by region validation and editing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegionError {
    #[error("{id}: {field} must be finite, got {value}")]
    NonFinite {
        id: RegionId,
        field: &'static str,
        value: f64,
    },

    #[error("{id}: duration must be positive, got {duration}")]
    InvalidDuration { id: RegionId, duration: f64 },

    #[error("{id}: zoom level must be at least 1.0, got {zoom_level}")]
    InvalidZoomLevel { id: RegionId, zoom_level: f64 },

    #[error("{id} does not exist")]
    NotFound { id: RegionId },

    #[error("{id}: trim region cannot be {action}")]
    TrimLocked { id: RegionId, action: &'static str },
}
