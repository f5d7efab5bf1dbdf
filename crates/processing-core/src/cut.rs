//! Cut-region logic shared by preview and export.
//!
//! Cut regions are half-open like zoom regions: a cut `[10, 12)` removes
//! `t = 10.0` but keeps `t = 12.0`.

use reframe_common::clock::{frame_time_secs, total_frames};
use reframe_project_model::{CutRegion, TimelineSpan};

/// Whether `time_secs` falls inside any cut.
pub fn is_in_cut_region(time_secs: f64, cuts: &[CutRegion]) -> bool {
    cut_region_at(time_secs, cuts).is_some()
}

/// The first cut (in slice order) covering `time_secs`.
pub fn cut_region_at(time_secs: f64, cuts: &[CutRegion]) -> Option<&CutRegion> {
    cuts.iter().find(|c| c.contains(time_secs))
}

/// The earliest time at or after `time_secs` that is not cut.
///
/// Back-to-back or overlapping cuts are crossed in one call. The result may
/// lie at or past the video end when the tail is cut.
pub fn skip_cuts(time_secs: f64, cuts: &[CutRegion]) -> f64 {
    let mut t = time_secs;
    // Each jump lands at the end of a distinct cut, so this terminates.
    for _ in 0..=cuts.len() {
        match cut_region_at(t, cuts) {
            Some(cut) => t = cut.end_time(),
            None => break,
        }
    }
    t
}

/// Number of frames an export at `fps` will hand to the encoder.
pub fn exported_frame_count(duration_secs: f64, fps: u32, cuts: &[CutRegion]) -> u64 {
    (0..total_frames(duration_secs, fps))
        .filter(|&i| !is_in_cut_region(frame_time_secs(i, fps), cuts))
        .count() as u64
}

/// Seconds of output left after removing cuts from `[0, duration_secs)`.
///
/// Overlapping cuts are only counted once.
pub fn edited_duration(duration_secs: f64, cuts: &[CutRegion]) -> f64 {
    let mut spans: Vec<(f64, f64)> = cuts
        .iter()
        .map(|c| (c.start_time.max(0.0), c.end_time().min(duration_secs)))
        .filter(|(start, end)| end > start)
        .collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut removed = 0.0;
    let mut covered_until = f64::NEG_INFINITY;
    for (start, end) in spans {
        let start = start.max(covered_until);
        if end > start {
            removed += end - start;
            covered_until = end;
        }
    }
    (duration_secs - removed).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_project_model::RegionId;

    fn cut(id: u64, start: f64, duration: f64) -> CutRegion {
        CutRegion {
            id: RegionId(id),
            start_time: start,
            duration,
            trim_type: None,
            z_index: 0,
        }
    }

    #[test]
    fn test_half_open_boundaries() {
        let cuts = [cut(1, 10.0, 2.0)];
        assert!(!is_in_cut_region(9.999, &cuts));
        assert!(is_in_cut_region(10.0, &cuts));
        assert!(is_in_cut_region(11.999, &cuts));
        assert!(!is_in_cut_region(12.0, &cuts));
    }

    #[test]
    fn test_skip_cuts_chains_adjacent_cuts() {
        let cuts = [cut(1, 4.0, 1.0), cut(2, 5.0, 2.0), cut(3, 6.5, 1.0)];
        assert_eq!(skip_cuts(4.2, &cuts), 7.5);
        assert_eq!(skip_cuts(3.0, &cuts), 3.0);
        assert_eq!(skip_cuts(8.0, &cuts), 8.0);
    }

    #[test]
    fn test_exported_frame_count_scenario() {
        let cuts = [cut(1, 10.0, 2.0)];
        assert_eq!(exported_frame_count(20.0, 30, &cuts), 600 - 60);
        assert_eq!(exported_frame_count(20.0, 30, &[]), 600);
        assert_eq!(exported_frame_count(0.0, 30, &cuts), 0);
    }

    #[test]
    fn test_edited_duration_merges_overlaps() {
        let cuts = [cut(1, 1.0, 2.0), cut(2, 2.0, 2.0), cut(3, 9.0, 5.0)];
        assert!((edited_duration(10.0, &cuts) - 6.0).abs() < 1e-12);
    }
}
