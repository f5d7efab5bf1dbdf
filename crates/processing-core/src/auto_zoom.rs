//! Auto-Zoom analysis: candidate zoom regions from mouse clicks.
//!
//! Clicks are where a viewer's attention goes, so bursts of clicks make good
//! zoom targets.
//!
//! # Algorithm
//!
//! 1. **Cluster** presses: consecutive presses closer than the cluster gap
//!    belong to the same burst.
//! 2. **Centroid** of each burst becomes the zoom target.
//! 3. **Span**: start a little before the first press and hold a while after
//!    the last one, never shorter than the minimum duration.
//! 4. **Merge** spans that overlap, weighting centroids by click count.
//! 5. **Clamp** to the video duration when it is known.

use serde::{Deserialize, Serialize};

use reframe_project_model::{
    Easing, MouseTrack, Point2D, RecordingGeometry, RegionEditor, RegionError, RegionId,
    ZoomMode, ZoomRegion, DEFAULT_TRANSITION_SECS, DEFAULT_ZOOM_LEVEL,
};

/// Configuration for the auto-zoom analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoZoomConfig {
    /// Presses closer together than this join one cluster (seconds).
    pub cluster_gap_secs: f64,

    /// How long before the first press the zoom starts (seconds).
    pub lead_in_secs: f64,

    /// How long after the last press the zoom lasts (seconds).
    pub hold_secs: f64,

    /// Shortest region generated (seconds).
    pub min_duration_secs: f64,

    /// Zoom level of generated regions.
    pub zoom_level: f64,

    /// Ease-in / ease-out length of generated regions (seconds).
    pub transition_secs: f64,

    pub easing: Easing,
}

impl Default for AutoZoomConfig {
    fn default() -> Self {
        Self {
            cluster_gap_secs: 1.5,
            lead_in_secs: 0.4,
            hold_secs: 1.6,
            min_duration_secs: 2.0,
            zoom_level: DEFAULT_ZOOM_LEVEL,
            transition_secs: DEFAULT_TRANSITION_SECS,
            easing: Easing::default(),
        }
    }
}

/// A burst of presses.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickCluster {
    /// Timestamp of the first press (seconds).
    pub first_secs: f64,
    /// Timestamp of the last press (seconds).
    pub last_secs: f64,
    /// Average press position in capture pixels.
    pub centroid: Point2D,
    pub click_count: usize,
}

/// A zoom span before it becomes a region.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    start: f64,
    end: f64,
    centroid: Point2D,
    weight: usize,
}

/// The auto-zoom analyzer.
pub struct AutoZoomAnalyzer {
    config: AutoZoomConfig,
}

impl AutoZoomAnalyzer {
    /// Create a new analyzer with the given configuration.
    pub fn new(config: AutoZoomConfig) -> Self {
        Self { config }
    }

    /// Create an analyzer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(AutoZoomConfig::default())
    }

    pub fn config(&self) -> &AutoZoomConfig {
        &self.config
    }

    /// Group presses into bursts.
    pub fn cluster_clicks(&self, mouse: &MouseTrack) -> Vec<ClickCluster> {
        let mut groups: Vec<Vec<Point2D>> = vec![];
        let mut bounds: Vec<(f64, f64)> = vec![];

        for press in mouse.presses() {
            match bounds.last_mut() {
                Some((_, last)) if press.timestamp - *last < self.config.cluster_gap_secs => {
                    *last = press.timestamp;
                    if let Some(group) = groups.last_mut() {
                        group.push(press.position());
                    }
                }
                _ => {
                    bounds.push((press.timestamp, press.timestamp));
                    groups.push(vec![press.position()]);
                }
            }
        }

        groups
            .into_iter()
            .zip(bounds)
            .map(|(points, (first_secs, last_secs))| ClickCluster {
                first_secs,
                last_secs,
                centroid: Self::compute_centroid(&points),
                click_count: points.len(),
            })
            .collect()
    }

    /// Build zoom regions (ids unassigned) from the mouse track.
    ///
    /// `video_duration` clamps the regions when known.
    pub fn analyze(
        &self,
        mouse: &MouseTrack,
        geometry: &RecordingGeometry,
        video_duration: Option<f64>,
    ) -> Vec<ZoomRegion> {
        let clusters = self.cluster_clicks(mouse);
        let candidates = self.merge(clusters.iter().map(|c| self.candidate(c)).collect());

        let regions: Vec<ZoomRegion> = candidates
            .into_iter()
            .filter_map(|c| self.to_region(c, geometry, video_duration))
            .collect();

        tracing::debug!(
            presses = mouse.presses().count(),
            clusters = clusters.len(),
            regions = regions.len(),
            "Auto-zoom analysis complete"
        );
        regions
    }

    /// Analyze and insert the resulting regions into an editor.
    pub fn populate(
        &self,
        editor: &mut RegionEditor,
        mouse: &MouseTrack,
        geometry: &RecordingGeometry,
    ) -> Result<Vec<RegionId>, RegionError> {
        let mut ids = vec![];
        for region in self.analyze(mouse, geometry, editor.video_duration()) {
            if let Some(id) = editor.insert_zoom_region(region)? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn candidate(&self, cluster: &ClickCluster) -> Candidate {
        let start = (cluster.first_secs - self.config.lead_in_secs).max(0.0);
        let end = (cluster.last_secs + self.config.hold_secs)
            .max(start + self.config.min_duration_secs);
        Candidate {
            start,
            end,
            centroid: cluster.centroid,
            weight: cluster.click_count,
        }
    }

    /// Merge overlapping candidates. Input is in time order.
    fn merge(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let mut merged: Vec<Candidate> = Vec::with_capacity(candidates.len());
        for next in candidates {
            match merged.last_mut() {
                Some(prev) if next.start < prev.end => {
                    let total = (prev.weight + next.weight) as f64;
                    let (wp, wn) = (prev.weight as f64 / total, next.weight as f64 / total);
                    prev.centroid = Point2D::new(
                        prev.centroid.x * wp + next.centroid.x * wn,
                        prev.centroid.y * wp + next.centroid.y * wn,
                    );
                    prev.end = prev.end.max(next.end);
                    prev.weight += next.weight;
                }
                _ => merged.push(next),
            }
        }
        merged
    }

    fn to_region(
        &self,
        candidate: Candidate,
        geometry: &RecordingGeometry,
        video_duration: Option<f64>,
    ) -> Option<ZoomRegion> {
        let mut end = candidate.end;
        if let Some(duration) = video_duration.filter(|d| d.is_finite() && *d > 0.0) {
            if candidate.start >= duration {
                return None;
            }
            end = end.min(duration);
        }
        let duration = end - candidate.start;
        if duration <= 0.0 {
            return None;
        }

        let target = geometry
            .normalize(candidate.centroid.x, candidate.centroid.y)
            .unwrap_or_default();

        Some(ZoomRegion {
            id: RegionId(0),
            start_time: candidate.start,
            duration,
            zoom_level: self.config.zoom_level.max(1.0),
            easing: self.config.easing,
            transition_duration: self.config.transition_secs.clamp(0.0, duration / 2.0),
            target_x: target.x,
            target_y: target.y,
            mode: ZoomMode::Auto,
            z_index: 0,
        })
    }

    /// Compute the centroid (average position) of a set of points.
    fn compute_centroid(points: &[Point2D]) -> Point2D {
        if points.is_empty() {
            return Point2D::default();
        }
        let n = points.len() as f64;
        let sum_x: f64 = points.iter().map(|p| p.x).sum();
        let sum_y: f64 = points.iter().map(|p| p.y).sum();
        Point2D::new(sum_x / n, sum_y / n)
    }
}
