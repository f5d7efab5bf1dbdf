//! Frame pacing utilities.
//!
//! Preview and export both address frames by timestamp. This module provides:
//! - Conversion between frame indices and timeline seconds
//! - A rate controller that gates preview redraws to a target Hz

/// Number of whole frames in `duration_secs` at `fps`.
///
/// Uses `floor`, so a trailing partial frame is never emitted.
pub fn total_frames(duration_secs: f64, fps: u32) -> u64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 || fps == 0 {
        return 0;
    }
    (duration_secs * fps as f64).floor() as u64
}

/// Timeline position of frame `index` at `fps`.
pub fn frame_time_secs(index: u64, fps: u32) -> f64 {
    index as f64 / fps.max(1) as f64
}

/// Convert nanoseconds to seconds.
pub fn ns_to_secs(ns: u64) -> f64 {
    ns as f64 / 1_000_000_000.0
}

/// Convert seconds to nanoseconds.
pub fn secs_to_ns(secs: f64) -> u64 {
    (secs.max(0.0) * 1_000_000_000.0) as u64
}

/// Frame rate controller for preview redraws.
#[derive(Debug)]
pub struct RateController {
    target_interval_ns: u64,
    last_tick_ns: Option<u64>,
}

impl RateController {
    /// Create a controller targeting the given Hz rate.
    pub fn new(target_hz: u32) -> Self {
        Self {
            target_interval_ns: 1_000_000_000 / target_hz.max(1) as u64,
            last_tick_ns: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, current_ns: u64) -> bool {
        match self.last_tick_ns {
            None => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            Some(last) if current_ns >= last + self.target_interval_ns => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            _ => false,
        }
    }

    /// Forget the last tick so the next call fires immediately.
    pub fn reset(&mut self) {
        self.last_tick_ns = None;
    }

    /// Target interval in nanoseconds.
    pub fn interval_ns(&self) -> u64 {
        self.target_interval_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_frames_floors_partial_frames() {
        assert_eq!(total_frames(20.0, 30), 600);
        assert_eq!(total_frames(1.99, 30), 59);
        assert_eq!(total_frames(0.0, 30), 0);
        assert_eq!(total_frames(f64::NAN, 30), 0);
        assert_eq!(total_frames(10.0, 0), 0);
    }

    #[test]
    fn test_frame_time() {
        assert!((frame_time_secs(300, 30) - 10.0).abs() < 1e-12);
        assert_eq!(frame_time_secs(0, 60), 0.0);
    }

    #[test]
    fn test_ns_to_secs_conversion() {
        assert!((ns_to_secs(1_500_000_000) - 1.5).abs() < 1e-9);
        assert_eq!(secs_to_ns(2.0), 2_000_000_000);
        assert_eq!(secs_to_ns(-1.0), 0);
    }

    #[test]
    fn test_rate_controller() {
        let mut ctrl = RateController::new(60);
        assert!(ctrl.should_tick(0)); // first tick always fires
        assert!(!ctrl.should_tick(1_000_000)); // 1ms later, too soon
        assert!(ctrl.should_tick(17_000_000)); // ~17ms later, should fire (60Hz ~ 16.67ms)
    }

    #[test]
    fn test_rate_controller_reset_fires_immediately() {
        let mut ctrl = RateController::new(60);
        assert!(ctrl.should_tick(0));
        assert!(!ctrl.should_tick(5_000_000));
        ctrl.reset();
        assert!(ctrl.should_tick(6_000_000));
    }
}
