//! The zoom/pan transform engine.
//!
//! Given a timestamp, the zoom regions, and the recorded mouse track,
//! compute the camera transform applied to the frame content. The result is
//! a pure function of its inputs: nothing is cached between calls, so the
//! preview and the exporter get identical transforms for the same time.
//!
//! # Phases
//!
//! A region `[start, start + duration)` with transition `d` runs through:
//!
//! 1. **Zoom-in** `[start, start + d)`: scale eases from 1 to the zoom level.
//! 2. **Hold** `[start + d, end - d)`: scale is the zoom level. `auto`
//!    regions pan to follow the mouse.
//! 3. **Zoom-out** `[end - d, end)`: scale eases back to 1 and the pan
//!    decays with it.
//!
//! Translations are in frame-content pixels inside the scaled space, i.e.
//! already divided by the scale they are applied under.

use serde::{Deserialize, Serialize};

use reframe_project_model::{
    active_zoom_region_at, ease_in_out_cubic, MouseTrack, Size, TimelineSpan, ZoomMode, ZoomRegion,
};

/// Time over which an auto pan eases in once the hold phase starts.
pub const PAN_EASE_IN_SECS: f64 = 0.5;

/// Mouse movement smaller than this fraction of the frame width does not pan.
pub const PAN_THRESHOLD_FRACTION: f64 = 0.01;

/// Camera transform for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub scale: f64,
    /// Horizontal pan in frame-content pixels, applied after scaling.
    pub translate_x: f64,
    /// Vertical pan in frame-content pixels, applied after scaling.
    pub translate_y: f64,
    /// Scale origin as a fraction of the frame width.
    pub origin_x: f64,
    /// Scale origin as a fraction of the frame height.
    pub origin_y: f64,
}

impl ZoomTransform {
    /// No zoom, no pan, origin at the centre.
    pub const IDENTITY: ZoomTransform = ZoomTransform {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
        origin_x: 0.5,
        origin_y: 0.5,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Where in its animation a region is at a given time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomPhase {
    /// Outside the region.
    Inactive,
    /// Easing in; `progress` in `[0, 1)`.
    ZoomIn { progress: f64 },
    Hold,
    /// Easing out; `progress` in `[0, 1)`.
    ZoomOut { progress: f64 },
}

/// Classify `time_secs` against one region.
pub fn zoom_phase(region: &ZoomRegion, time_secs: f64) -> ZoomPhase {
    if !region.contains(time_secs) {
        return ZoomPhase::Inactive;
    }

    let transition = region.transition_duration;
    let zoom_in_end = region.start_time + transition;
    let zoom_out_start = region.zoom_out_start();

    if time_secs < zoom_in_end {
        ZoomPhase::ZoomIn {
            progress: (time_secs - region.start_time) / transition,
        }
    } else if time_secs < zoom_out_start {
        ZoomPhase::Hold
    } else if transition > 0.0 {
        ZoomPhase::ZoomOut {
            progress: (time_secs - zoom_out_start) / transition,
        }
    } else {
        ZoomPhase::Hold
    }
}

/// Transform origin for a focus target, snapped to the frame edge when the
/// target is too close to it for the zoom level.
///
/// With boundary `b = 0.5 * (1 - 1/zoom)`, a target beyond `+b` pins the
/// origin to `1`, beyond `-b` to `0`, and otherwise maps to `target + 0.5`.
pub fn transform_origin(target_x: f64, target_y: f64, zoom_level: f64) -> (f64, f64) {
    let boundary = 0.5 * (1.0 - 1.0 / zoom_level.max(1.0));
    (
        snap_origin(target_x, boundary),
        snap_origin(target_y, boundary),
    )
}

fn snap_origin(target: f64, boundary: f64) -> f64 {
    if target > boundary {
        1.0
    } else if target < -boundary {
        0.0
    } else {
        target + 0.5
    }
}

/// `a` at `t = 0`, `b` at `t = 1`, exact at both ends.
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Compute the camera transform at `time_secs`.
///
/// `original_video` is the recorded video size (mouse coordinates live in
/// it); `frame_content` is the size of the on-screen frame the video is
/// drawn into. The first region in `regions` covering `time_secs` wins.
pub fn calculate_zoom_transform(
    time_secs: f64,
    regions: &[ZoomRegion],
    mouse: &MouseTrack,
    original_video: Size,
    frame_content: Size,
) -> ZoomTransform {
    let Some(region) = active_zoom_region_at(regions, time_secs) else {
        return ZoomTransform::IDENTITY;
    };

    let zoom = region.zoom_level;
    let (origin_x, origin_y) = transform_origin(region.target_x, region.target_y, zoom);
    let at = |scale: f64, translate_x: f64, translate_y: f64| ZoomTransform {
        scale,
        translate_x,
        translate_y,
        origin_x,
        origin_y,
    };

    match zoom_phase(region, time_secs) {
        ZoomPhase::Inactive => ZoomTransform::IDENTITY,
        ZoomPhase::ZoomIn { progress } => {
            at(lerp(1.0, zoom, region.easing.apply(progress)), 0.0, 0.0)
        }
        ZoomPhase::Hold => {
            let (pan_x, pan_y) = hold_pan(region, time_secs, mouse, original_video, frame_content);
            at(zoom, pan_x / zoom, pan_y / zoom)
        }
        ZoomPhase::ZoomOut { progress } => {
            let scale = lerp(zoom, 1.0, region.easing.apply(progress));
            if zoom <= 1.0 {
                return at(scale, 0.0, 0.0);
            }
            // Decay the hold-end pan with the remaining zoom so it is
            // continuous at the phase start and zero once the scale is 1.
            let (pan_x, pan_y) = hold_pan(
                region,
                region.zoom_out_start(),
                mouse,
                original_video,
                frame_content,
            );
            let remaining = ((scale - 1.0) / (zoom - 1.0)).clamp(0.0, 1.0);
            let divisor = scale.max(1.0);
            at(scale, pan_x * remaining / divisor, pan_y * remaining / divisor)
        }
    }
}

/// Clamped pan in frame-content pixels (not yet divided by the zoom) for a
/// hold-phase time of an `auto` region.
///
/// Pans by the opposite of the mouse movement since the hold started, eased
/// in over [`PAN_EASE_IN_SECS`], and clamped so the zoomed content always
/// covers the frame.
pub fn hold_pan(
    region: &ZoomRegion,
    time_secs: f64,
    mouse: &MouseTrack,
    original_video: Size,
    frame_content: Size,
) -> (f64, f64) {
    if region.mode == ZoomMode::Fixed || !original_video.is_valid() || !frame_content.is_valid() {
        return (0.0, 0.0);
    }

    let hold_start = region.start_time + region.transition_duration;
    let (Some(from), Some(to)) = (mouse.position_at(hold_start), mouse.position_at(time_secs))
    else {
        return (0.0, 0.0);
    };

    let dx = (to.x - from.x) * frame_content.width / original_video.width;
    let dy = (to.y - from.y) * frame_content.height / original_video.height;
    if dx.hypot(dy) <= PAN_THRESHOLD_FRACTION * frame_content.width {
        return (0.0, 0.0);
    }

    let ease = ease_in_out_cubic(((time_secs - hold_start) / PAN_EASE_IN_SECS).clamp(0.0, 1.0));
    let max_x = (frame_content.width * (region.zoom_level - 1.0) / 2.0).max(0.0);
    let max_y = (frame_content.height * (region.zoom_level - 1.0) / 2.0).max(0.0);

    (
        (-dx * ease).clamp(-max_x, max_x),
        (-dy * ease).clamp(-max_y, max_y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_project_model::{Easing, MouseEvent, RegionId};

    fn region(mode: ZoomMode) -> ZoomRegion {
        ZoomRegion {
            id: RegionId(1),
            start_time: 2.0,
            duration: 4.0,
            zoom_level: 2.0,
            easing: Easing::EaseInOutCubic,
            transition_duration: 1.0,
            target_x: 0.0,
            target_y: 0.0,
            mode,
            z_index: 0,
        }
    }

    fn size(w: f64, h: f64) -> Size {
        Size::new(w, h)
    }

    #[test]
    fn test_phase_classification() {
        let r = region(ZoomMode::Fixed);
        assert_eq!(zoom_phase(&r, 1.0), ZoomPhase::Inactive);
        assert_eq!(zoom_phase(&r, 2.0), ZoomPhase::ZoomIn { progress: 0.0 });
        assert_eq!(zoom_phase(&r, 3.0), ZoomPhase::Hold);
        assert_eq!(zoom_phase(&r, 5.0), ZoomPhase::ZoomOut { progress: 0.0 });
        assert_eq!(zoom_phase(&r, 6.0), ZoomPhase::Inactive);
    }

    #[test]
    fn test_origin_snapping() {
        assert_eq!(transform_origin(0.49, 0.0, 2.0), (1.0, 0.5));
        assert_eq!(transform_origin(-0.3, 0.0, 2.0), (0.0, 0.5));
        assert_eq!(transform_origin(0.25, -0.25, 2.0), (0.75, 0.25));
    }

    #[test]
    fn test_no_regions_is_identity() {
        let t = calculate_zoom_transform(
            1.0,
            &[],
            &MouseTrack::default(),
            size(1920.0, 1080.0),
            size(1600.0, 900.0),
        );
        assert_eq!(t, ZoomTransform::IDENTITY);
    }

    #[test]
    fn test_fixed_region_never_pans() {
        let mouse = MouseTrack::new(vec![
            MouseEvent::moved(0.0, 0.0, 0.0),
            MouseEvent::moved(4.0, 1900.0, 1000.0),
        ]);
        let t = calculate_zoom_transform(
            4.5,
            &[region(ZoomMode::Fixed)],
            &mouse,
            size(1920.0, 1080.0),
            size(1920.0, 1080.0),
        );
        assert_eq!(t.scale, 2.0);
        assert_eq!((t.translate_x, t.translate_y), (0.0, 0.0));
    }

    #[test]
    fn test_small_movement_below_threshold_does_not_pan() {
        let mouse = MouseTrack::new(vec![
            MouseEvent::moved(0.0, 500.0, 300.0),
            MouseEvent::moved(3.5, 505.0, 303.0),
        ]);
        let t = calculate_zoom_transform(
            4.0,
            &[region(ZoomMode::Auto)],
            &mouse,
            size(1000.0, 600.0),
            size(1000.0, 600.0),
        );
        assert_eq!((t.translate_x, t.translate_y), (0.0, 0.0));
    }

    #[test]
    fn test_empty_metadata_means_no_pan() {
        let t = calculate_zoom_transform(
            4.0,
            &[region(ZoomMode::Auto)],
            &MouseTrack::default(),
            size(1000.0, 600.0),
            size(1000.0, 600.0),
        );
        assert_eq!(t.scale, 2.0);
        assert_eq!((t.translate_x, t.translate_y), (0.0, 0.0));
    }

    #[test]
    fn test_large_movement_is_clamped() {
        let mouse = MouseTrack::new(vec![
            MouseEvent::moved(0.0, 0.0, 0.0),
            MouseEvent::moved(3.2, 5000.0, -5000.0),
        ]);
        let t = calculate_zoom_transform(
            4.0,
            &[region(ZoomMode::Auto)],
            &mouse,
            size(1000.0, 600.0),
            size(800.0, 480.0),
        );
        // max pan is 800 * (2 - 1) / 2 = 400 px, divided by zoom 2.
        assert!((t.translate_x + 200.0).abs() < 1e-9);
        assert!((t.translate_y - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_out_pan_decays_to_zero() {
        let mouse = MouseTrack::new(vec![
            MouseEvent::moved(0.0, 100.0, 100.0),
            MouseEvent::moved(3.5, 400.0, 100.0),
        ]);
        let regions = [region(ZoomMode::Auto)];
        let video = size(1000.0, 600.0);
        let before = calculate_zoom_transform(4.999_999, &regions, &mouse, video, video);
        let at_start = calculate_zoom_transform(5.0, &regions, &mouse, video, video);
        let near_end = calculate_zoom_transform(5.999_999, &regions, &mouse, video, video);

        assert!(before.translate_x < 0.0);
        assert!((before.translate_x - at_start.translate_x).abs() < 1e-3);
        assert!(near_end.translate_x.abs() < 1e-6);
    }
}
