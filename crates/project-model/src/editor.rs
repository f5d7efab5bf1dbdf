//! Region editing state and the operations that mutate it.
//!
//! [`RegionEditor`] owns the timeline together with the editing context the
//! operations depend on: the known video duration, the playhead and the
//! current selection. Every mutation goes through a method here so z-index
//! recomputation and clamping happen in one place.

use crate::easing::Easing;
use crate::event::MouseTrack;
use crate::geometry::RecordingGeometry;
use crate::region::{
    CutRegion, RegionEdge, RegionError, RegionId, RegionPatch, TimelineSpan, TrimType, ZoomMode,
    ZoomRegion, DEFAULT_CUT_DURATION_SECS, DEFAULT_TRANSITION_SECS, DEFAULT_ZOOM_DURATION_SECS,
    DEFAULT_ZOOM_LEVEL,
};
use crate::timeline::Timeline;

/// Regions shorter than this after clamping are dropped.
const MIN_REGION_SECS: f64 = 1e-6;

/// Editing state over a [`Timeline`].
#[derive(Debug, Clone, Default)]
pub struct RegionEditor {
    timeline: Timeline,
    video_duration: Option<f64>,
    playhead: f64,
    selected: Option<RegionId>,
}

impl RegionEditor {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            video_duration: None,
            playhead: 0.0,
            selected: None,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn into_timeline(self) -> Timeline {
        self.timeline
    }

    pub fn video_duration(&self) -> Option<f64> {
        self.video_duration
    }

    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    pub fn selected(&self) -> Option<RegionId> {
        self.selected
    }

    /// Duration usable for placing regions, if known and non-zero.
    fn known_duration(&self) -> Option<f64> {
        self.video_duration.filter(|d| d.is_finite() && *d > 0.0)
    }

    /// Move the playhead. Clamped into the video when the duration is known.
    pub fn set_playhead(&mut self, time_secs: f64) {
        if !time_secs.is_finite() {
            return;
        }
        self.playhead = match self.known_duration() {
            Some(duration) => time_secs.clamp(0.0, duration),
            None => time_secs.max(0.0),
        };
    }

    /// Select a region. Selecting an unknown id clears the selection.
    pub fn select(&mut self, id: Option<RegionId>) {
        self.selected = id.filter(|id| self.timeline.contains(*id));
    }

    /// Record the loaded video's duration and clamp every region into it.
    ///
    /// Starts are pulled into `[0, duration)`, ends are cut at `duration`, and
    /// regions with nothing left are removed. Unknown or zero durations are
    /// ignored.
    pub fn set_video_duration(&mut self, duration: f64) {
        if !duration.is_finite() || duration <= 0.0 {
            return;
        }
        self.video_duration = Some(duration);

        let clamp = |start: &mut f64, len: &mut f64| {
            let end = (*start + *len).min(duration);
            *start = start.clamp(0.0, duration);
            *len = (end - *start).max(0.0);
        };
        self.timeline.for_each_region_mut(
            |zoom| {
                clamp(&mut zoom.start_time, &mut zoom.duration);
                zoom.transition_duration = zoom.transition_duration.min(zoom.duration / 2.0);
            },
            |cut| clamp(&mut cut.start_time, &mut cut.duration),
        );
        self.timeline.retain(
            |zoom| zoom.duration > MIN_REGION_SECS,
            |cut| cut.duration > MIN_REGION_SECS,
        );

        if let Some(id) = self.selected {
            if !self.timeline.contains(id) {
                self.selected = None;
            }
        }
        self.playhead = self.playhead.min(duration);
        self.timeline.recompute_z_indices();
    }

    /// Length available from `start` to the end of the video, capped at
    /// `wanted`. `None` when nothing fits.
    fn fit_duration(&self, start: f64, wanted: f64) -> Option<f64> {
        let duration = self.known_duration()?;
        if start >= duration {
            return None;
        }
        let fitted = wanted.min(duration - start);
        (fitted > MIN_REGION_SECS).then_some(fitted)
    }

    /// Add a zoom region at the playhead with default settings.
    ///
    /// The target comes from the last mouse position at or before the
    /// playhead, normalized against the capture geometry; the frame centre is
    /// used when no position is known. Returns `None` without changing
    /// anything when the video duration is unknown or the playhead is at the
    /// end.
    pub fn add_zoom_region(
        &mut self,
        mouse: &MouseTrack,
        geometry: &RecordingGeometry,
    ) -> Option<RegionId> {
        let start = self.playhead;
        let duration = self.fit_duration(start, DEFAULT_ZOOM_DURATION_SECS)?;

        let target = mouse
            .position_at(start)
            .and_then(|p| geometry.normalize(p.x, p.y))
            .unwrap_or_default();

        let region = ZoomRegion {
            id: RegionId(0),
            start_time: start,
            duration,
            zoom_level: DEFAULT_ZOOM_LEVEL,
            easing: Easing::default(),
            transition_duration: DEFAULT_TRANSITION_SECS.min(duration / 2.0),
            target_x: target.x,
            target_y: target.y,
            mode: ZoomMode::Auto,
            z_index: 0,
        };
        Some(self.timeline.insert_zoom(region))
    }

    /// Add a cut region.
    ///
    /// Starts at the playhead unless the patch says otherwise and lasts
    /// [`DEFAULT_CUT_DURATION_SECS`] unless overridden, clamped to the video
    /// end. Returns `Ok(None)` when nothing fits.
    pub fn add_cut_region(&mut self, patch: RegionPatch) -> Result<Option<RegionId>, RegionError> {
        let mut region = CutRegion {
            id: RegionId(0),
            start_time: self.playhead,
            duration: DEFAULT_CUT_DURATION_SECS,
            trim_type: None,
            z_index: 0,
        };
        patch.apply_to_cut(&mut region);
        region.validate()?;

        let Some(duration) = self.fit_duration(region.start_time, region.duration) else {
            return Ok(None);
        };
        region.duration = duration;
        Ok(Some(self.timeline.insert_cut(region)))
    }

    /// Insert a fully specified zoom region, e.g. from auto generation.
    ///
    /// The draft is validated and clamped to the video like any other
    /// region. Its id is replaced with a fresh one.
    pub fn insert_zoom_region(
        &mut self,
        mut draft: ZoomRegion,
    ) -> Result<Option<RegionId>, RegionError> {
        draft.validate()?;
        if self.video_duration.is_some() {
            let Some(duration) = self.fit_duration(draft.start_time, draft.duration) else {
                return Ok(None);
            };
            draft.duration = duration;
            draft.transition_duration = draft.transition_duration.min(duration / 2.0);
        }
        Ok(Some(self.timeline.insert_zoom(draft)))
    }

    /// Add a cut from the start of the video to the playhead.
    pub fn trim_start(&mut self) -> Result<Option<RegionId>, RegionError> {
        if self.playhead <= MIN_REGION_SECS {
            return Ok(None);
        }
        self.add_cut_region(
            RegionPatch::default()
                .with_start(0.0)
                .with_duration(self.playhead)
                .with_trim(TrimType::Start),
        )
    }

    /// Add a cut from the playhead to the end of the video.
    pub fn trim_end(&mut self) -> Result<Option<RegionId>, RegionError> {
        let Some(duration) = self.known_duration() else {
            return Ok(None);
        };
        self.add_cut_region(
            RegionPatch::default()
                .with_start(self.playhead)
                .with_duration(duration - self.playhead)
                .with_trim(TrimType::End),
        )
    }

    /// Merge a patch into the region with `id`.
    ///
    /// The merged region is validated before it replaces the stored one, so
    /// a rejected patch leaves the timeline untouched. Z-indices are only
    /// recomputed when the duration changed.
    pub fn update_region(&mut self, id: RegionId, patch: &RegionPatch) -> Result<(), RegionError> {
        if let Some(stored) = self.timeline.zoom_region_mut(id) {
            let mut next = stored.clone();
            patch.apply_to_zoom(&mut next);
            next.validate()?;
            let duration_changed = next.duration != stored.duration;
            *stored = next;
            if duration_changed {
                self.timeline.recompute_z_indices();
            }
            return Ok(());
        }

        if let Some(stored) = self.timeline.cut_region_mut(id) {
            let mut next = stored.clone();
            patch.apply_to_cut(&mut next);
            next.validate()?;
            let duration_changed = next.duration != stored.duration;
            *stored = next;
            if duration_changed {
                self.timeline.recompute_z_indices();
            }
            return Ok(());
        }

        Err(RegionError::NotFound { id })
    }

    /// Remove a region. Deleting an unknown id is a no-op.
    pub fn delete_region(&mut self, id: RegionId) {
        self.timeline.remove(id);
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    /// Drag one edge of a cut to `time_secs`, honoring trim restrictions.
    pub fn resize_cut(
        &mut self,
        id: RegionId,
        edge: RegionEdge,
        time_secs: f64,
    ) -> Result<(), RegionError> {
        let cut = self
            .timeline
            .cut_region(id)
            .ok_or(RegionError::NotFound { id })?;
        if !cut.can_resize(edge) {
            return Err(RegionError::TrimLocked {
                id,
                action: match edge {
                    RegionEdge::Left => "resized from the left",
                    RegionEdge::Right => "resized from the right",
                },
            });
        }

        let end = cut.end_time();
        let patch = match edge {
            RegionEdge::Left => RegionPatch::default()
                .with_start(time_secs)
                .with_duration(end - time_secs),
            RegionEdge::Right => {
                let end = match self.known_duration() {
                    Some(duration) => time_secs.min(duration),
                    None => time_secs,
                };
                RegionPatch::default().with_duration(end - cut.start_time)
            }
        };
        self.update_region(id, &patch)
    }

    /// Shift an untyped cut to start at `start_secs`, keeping its length.
    pub fn move_cut(&mut self, id: RegionId, start_secs: f64) -> Result<(), RegionError> {
        let cut = self
            .timeline
            .cut_region(id)
            .ok_or(RegionError::NotFound { id })?;
        if !cut.can_move() {
            return Err(RegionError::TrimLocked { id, action: "moved" });
        }

        let mut start = start_secs.max(0.0);
        if let Some(duration) = self.known_duration() {
            start = start.min((duration - cut.duration).max(0.0));
        }
        self.update_region(id, &RegionPatch::default().with_start(start))
    }

    /// The zoom region covering `time_secs`.
    ///
    /// When regions overlap, the one created first wins.
    pub fn active_zoom_region_at(&self, time_secs: f64) -> Option<&ZoomRegion> {
        active_zoom_region_at(self.timeline.zoom_regions(), time_secs)
    }

    /// The cut region covering `time_secs`. The one created first wins.
    pub fn active_cut_region_at(&self, time_secs: f64) -> Option<&CutRegion> {
        self.timeline.cut_regions().find(|r| r.contains(time_secs))
    }
}

/// First region in iteration order whose half-open span contains `time_secs`.
pub fn active_zoom_region_at<'a>(
    regions: impl IntoIterator<Item = &'a ZoomRegion>,
    time_secs: f64,
) -> Option<&'a ZoomRegion> {
    regions.into_iter().find(|r| r.contains(time_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{MouseButton, MouseEvent};
    use crate::timeline::Z_INDEX_BASE;

    fn editor(duration: f64) -> RegionEditor {
        let mut editor = RegionEditor::default();
        editor.set_video_duration(duration);
        editor
    }

    fn geometry() -> RecordingGeometry {
        RecordingGeometry::new(0.0, 0.0, 1000.0, 500.0)
    }

    #[test]
    fn test_add_zoom_region_uses_defaults_and_mouse_target() {
        let mut editor = editor(60.0);
        editor.set_playhead(4.0);
        let mouse = MouseTrack::new(vec![
            MouseEvent::moved(1.0, 100.0, 100.0),
            MouseEvent::moved(3.5, 750.0, 125.0),
            MouseEvent::moved(6.0, 0.0, 0.0),
        ]);

        let id = editor.add_zoom_region(&mouse, &geometry()).unwrap();
        let region = editor.timeline().zoom_region(id).unwrap();
        assert_eq!(region.start_time, 4.0);
        assert_eq!(region.duration, DEFAULT_ZOOM_DURATION_SECS);
        assert_eq!(region.zoom_level, DEFAULT_ZOOM_LEVEL);
        assert_eq!(region.easing, Easing::EaseInOutCubic);
        assert_eq!(region.transition_duration, DEFAULT_TRANSITION_SECS);
        assert!((region.target_x - 0.25).abs() < 1e-12);
        assert!((region.target_y + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_add_zoom_region_without_mouse_targets_centre() {
        let mut editor = editor(10.0);
        let id = editor
            .add_zoom_region(&MouseTrack::default(), &geometry())
            .unwrap();
        let region = editor.timeline().zoom_region(id).unwrap();
        assert_eq!((region.target_x, region.target_y), (0.0, 0.0));
    }

    #[test]
    fn test_add_zoom_region_clamped_to_video_end() {
        let mut editor = editor(10.0);
        editor.set_playhead(9.0);
        let id = editor
            .add_zoom_region(&MouseTrack::default(), &geometry())
            .unwrap();
        let region = editor.timeline().zoom_region(id).unwrap();
        assert!((region.end_time() - 10.0).abs() < 1e-12);
        assert!(region.transition_duration <= region.duration / 2.0);
    }

    #[test]
    fn test_add_is_noop_without_duration_or_at_end() {
        let mut unknown = RegionEditor::default();
        assert!(unknown
            .add_zoom_region(&MouseTrack::default(), &geometry())
            .is_none());
        assert_eq!(unknown.add_cut_region(RegionPatch::default()), Ok(None));

        let mut at_end = editor(5.0);
        at_end.set_playhead(5.0);
        assert!(at_end
            .add_zoom_region(&MouseTrack::default(), &geometry())
            .is_none());
        assert!(at_end.timeline().is_empty());
    }

    #[test]
    fn test_zero_duration_is_ignored() {
        let mut editor = RegionEditor::default();
        editor.set_video_duration(0.0);
        assert_eq!(editor.video_duration(), None);
    }

    #[test]
    fn test_add_cut_region_default_and_override() {
        let mut editor = editor(30.0);
        editor.set_playhead(3.0);
        let a = editor.add_cut_region(RegionPatch::default()).unwrap().unwrap();
        let b = editor
            .add_cut_region(RegionPatch::default().with_start(20.0).with_duration(15.0))
            .unwrap()
            .unwrap();
        assert_eq!(editor.timeline().cut_region(a).unwrap().duration, 2.0);
        assert_eq!(editor.timeline().cut_region(b).unwrap().duration, 10.0);
    }

    #[test]
    fn test_update_region_merges_and_rejects_bad_values() {
        let mut editor = editor(30.0);
        let id = editor
            .add_zoom_region(&MouseTrack::default(), &geometry())
            .unwrap();

        let patch = RegionPatch {
            zoom_level: Some(3.0),
            mode: Some(ZoomMode::Fixed),
            ..Default::default()
        };
        editor.update_region(id, &patch).unwrap();
        let region = editor.timeline().zoom_region(id).unwrap();
        assert_eq!(region.zoom_level, 3.0);
        assert_eq!(region.mode, ZoomMode::Fixed);
        assert_eq!(region.duration, DEFAULT_ZOOM_DURATION_SECS);

        let bad = RegionPatch {
            zoom_level: Some(f64::INFINITY),
            ..Default::default()
        };
        assert!(editor.update_region(id, &bad).is_err());
        assert_eq!(editor.timeline().zoom_region(id).unwrap().zoom_level, 3.0);
    }

    #[test]
    fn test_update_unknown_region_is_error() {
        let mut editor = editor(30.0);
        let err = editor
            .update_region(RegionId(42), &RegionPatch::default())
            .unwrap_err();
        assert_eq!(err, RegionError::NotFound { id: RegionId(42) });
    }

    #[test]
    fn test_update_duration_recomputes_z_index() {
        let mut editor = editor(60.0);
        let a = editor
            .add_cut_region(RegionPatch::default().with_duration(1.0))
            .unwrap()
            .unwrap();
        let b = editor
            .add_cut_region(RegionPatch::default().with_start(10.0).with_duration(4.0))
            .unwrap()
            .unwrap();
        assert_eq!(editor.timeline().cut_region(a).unwrap().z_index, Z_INDEX_BASE);

        editor
            .update_region(a, &RegionPatch::default().with_duration(8.0))
            .unwrap();
        assert_eq!(editor.timeline().cut_region(b).unwrap().z_index, Z_INDEX_BASE);
        assert_eq!(
            editor.timeline().cut_region(a).unwrap().z_index,
            Z_INDEX_BASE - 1
        );
    }

    #[test]
    fn test_delete_region_is_idempotent_and_clears_selection() {
        let mut editor = editor(30.0);
        let id = editor
            .add_zoom_region(&MouseTrack::default(), &geometry())
            .unwrap();
        editor.select(Some(id));
        assert_eq!(editor.selected(), Some(id));

        editor.delete_region(id);
        assert!(editor.timeline().is_empty());
        assert_eq!(editor.selected(), None);
        editor.delete_region(id);
        assert!(editor.timeline().is_empty());
    }

    #[test]
    fn test_overlapping_zoom_regions_first_created_wins() {
        let mut editor = editor(30.0);
        editor.set_playhead(2.0);
        let first = editor
            .add_zoom_region(&MouseTrack::default(), &geometry())
            .unwrap();
        editor.set_playhead(1.0);
        let second = editor
            .add_zoom_region(&MouseTrack::default(), &geometry())
            .unwrap();

        assert_eq!(editor.active_zoom_region_at(1.5).unwrap().id, second);
        assert_eq!(editor.active_zoom_region_at(2.5).unwrap().id, first);
        assert!(editor.active_zoom_region_at(5.0).is_none());
    }

    #[test]
    fn test_set_video_duration_clamps_and_drops_regions() {
        let mut editor = editor(60.0);
        let inside = editor
            .add_cut_region(RegionPatch::default().with_start(1.0))
            .unwrap()
            .unwrap();
        let straddling = editor
            .add_cut_region(RegionPatch::default().with_start(9.0).with_duration(5.0))
            .unwrap()
            .unwrap();
        let beyond = editor
            .add_cut_region(RegionPatch::default().with_start(30.0))
            .unwrap()
            .unwrap();
        editor.select(Some(beyond));

        editor.set_video_duration(10.0);
        assert!(editor.timeline().cut_region(inside).is_some());
        assert_eq!(editor.timeline().cut_region(straddling).unwrap().duration, 1.0);
        assert!(editor.timeline().cut_region(beyond).is_none());
        assert_eq!(editor.selected(), None);
    }

    #[test]
    fn test_trim_handles_respect_edges() {
        let mut editor = editor(20.0);
        editor.set_playhead(2.0);
        let start = editor.trim_start().unwrap().unwrap();
        editor.set_playhead(18.0);
        let end = editor.trim_end().unwrap().unwrap();

        let start_cut = editor.timeline().cut_region(start).unwrap();
        assert_eq!((start_cut.start_time, start_cut.duration), (0.0, 2.0));
        let end_cut = editor.timeline().cut_region(end).unwrap();
        assert_eq!((end_cut.start_time, end_cut.duration), (18.0, 2.0));

        assert!(matches!(
            editor.resize_cut(start, RegionEdge::Left, 1.0),
            Err(RegionError::TrimLocked { .. })
        ));
        assert!(matches!(
            editor.move_cut(end, 10.0),
            Err(RegionError::TrimLocked { .. })
        ));

        editor.resize_cut(start, RegionEdge::Right, 3.0).unwrap();
        assert_eq!(editor.timeline().cut_region(start).unwrap().duration, 3.0);
        editor.resize_cut(end, RegionEdge::Left, 17.0).unwrap();
        let end_cut = editor.timeline().cut_region(end).unwrap();
        assert_eq!((end_cut.start_time, end_cut.duration), (17.0, 3.0));
    }

    #[test]
    fn test_move_cut_keeps_length_inside_video() {
        let mut editor = editor(10.0);
        let id = editor
            .add_cut_region(RegionPatch::default().with_start(1.0))
            .unwrap()
            .unwrap();
        editor.move_cut(id, 9.5).unwrap();
        let cut = editor.timeline().cut_region(id).unwrap();
        assert_eq!((cut.start_time, cut.duration), (8.0, 2.0));
    }

    #[test]
    fn test_insert_zoom_region_replaces_id_and_clamps() {
        let mut editor = editor(5.0);
        let draft = ZoomRegion {
            id: RegionId(99),
            start_time: 3.0,
            duration: 4.0,
            zoom_level: 1.5,
            easing: Easing::EaseOutElastic,
            transition_duration: 1.5,
            target_x: 0.1,
            target_y: 0.1,
            mode: ZoomMode::Auto,
            z_index: 0,
        };
        let id = editor.insert_zoom_region(draft).unwrap().unwrap();
        assert_ne!(id, RegionId(99));
        let region = editor.timeline().zoom_region(id).unwrap();
        assert_eq!(region.duration, 2.0);
        assert_eq!(region.transition_duration, 1.0);
    }

    #[test]
    fn test_click_before_playhead_seeds_target() {
        let mut editor = editor(10.0);
        editor.set_playhead(2.0);
        let mouse = MouseTrack::new(vec![MouseEvent::click(
            1.0,
            1000.0,
            500.0,
            MouseButton::Left,
        )]);
        let id = editor.add_zoom_region(&mouse, &geometry()).unwrap();
        let region = editor.timeline().zoom_region(id).unwrap();
        assert_eq!((region.target_x, region.target_y), (0.5, 0.5));
    }
}
