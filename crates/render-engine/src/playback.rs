//! Live preview playback.
//!
//! The driver keeps a wall-clock anchor while playing: the playhead is the
//! anchored source time plus the time elapsed since the anchor. Cuts are
//! jumped by re-anchoring at the cut's end, so preview skips them exactly
//! like export does.

use std::time::Duration;

use tiny_skia::Pixmap;
use tokio::time::{Instant, MissedTickBehavior};

use reframe_common::clock::{ns_to_secs, RateController};
use reframe_common::error::ReframeResult;
use reframe_processing_core::skip_cuts;

use crate::compositor::{FrameRenderer, Scene};
use crate::export::CancelFlag;
use crate::source::MediaSources;

/// Drives preview rendering for one set of media sources.
pub struct PreviewDriver {
    renderer: FrameRenderer,
    sources: MediaSources,
    rate: RateController,
    playing: bool,
    /// `(wall clock ns, source time)` the playhead is measured from.
    anchor: Option<(u64, f64)>,
    position: f64,
}

impl PreviewDriver {
    pub fn new(renderer: FrameRenderer, sources: MediaSources, target_hz: u32) -> Self {
        Self {
            renderer,
            sources,
            rate: RateController::new(target_hz),
            playing: false,
            anchor: None,
            position: 0.0,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.sources.duration_secs().max(0.0)
    }

    /// Source time of the last rendered frame.
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn renderer(&self) -> &FrameRenderer {
        &self.renderer
    }

    /// The last rendered frame.
    pub fn surface(&self) -> &Pixmap {
        self.renderer.surface()
    }

    /// Start playing from the current position. Playing from the end
    /// restarts at zero.
    pub fn play(&mut self, now_ns: u64) {
        if self.position >= self.duration_secs() {
            self.position = 0.0;
        }
        self.playing = true;
        self.anchor = Some((now_ns, self.position));
        self.rate.reset();
        tracing::debug!(position = self.position, "Preview playing");
    }

    pub fn pause(&mut self) {
        self.playing = false;
        self.anchor = None;
        tracing::debug!(position = self.position, "Preview paused");
    }

    /// Scrub to `time_secs` and render it immediately.
    ///
    /// The target is clamped to the video and moved past any cut. Returns
    /// the position actually shown.
    pub fn seek(&mut self, time_secs: f64) -> ReframeResult<f64> {
        let duration = self.duration_secs();
        let target = if time_secs.is_finite() {
            time_secs.clamp(0.0, duration)
        } else {
            0.0
        };
        let target = skip_cuts(target, &self.renderer.scene().cut_regions).min(duration);
        if self.playing {
            // Re-anchored on the next tick.
            self.anchor = None;
        }
        self.render_at(target)?;
        Ok(self.position)
    }

    /// Swap the scene after an edit and redraw the current frame.
    pub fn set_scene(&mut self, scene: Scene) -> ReframeResult<()> {
        self.renderer.set_scene(scene);
        self.render_at(self.position)
    }

    /// Advance playback to `now_ns`. Returns whether a frame was rendered.
    ///
    /// Does nothing while paused or when the rate limit has not elapsed.
    pub fn tick(&mut self, now_ns: u64) -> ReframeResult<bool> {
        if !self.playing || !self.rate.should_tick(now_ns) {
            return Ok(false);
        }

        let (anchor_ns, anchor_time) = *self.anchor.get_or_insert((now_ns, self.position));
        let clock_time = anchor_time + ns_to_secs(now_ns.saturating_sub(anchor_ns));
        let mut t = skip_cuts(clock_time, &self.renderer.scene().cut_regions);
        if t != clock_time {
            tracing::debug!(from = clock_time, to = t, "Preview skipped cut");
            self.anchor = Some((now_ns, t));
        }

        let duration = self.duration_secs();
        if t >= duration {
            t = duration;
            self.pause();
        }
        self.render_at(t)?;
        Ok(true)
    }

    fn render_at(&mut self, time_secs: f64) -> ReframeResult<()> {
        self.sources.seek_all(time_secs)?;
        let shown = self.sources.video.current_time();
        self.renderer.render_sources(shown, &self.sources)?;
        self.position = shown;
        tracing::trace!(time_secs = shown, "Preview frame rendered");
        Ok(())
    }
}

/// Tick `driver` on a tokio interval until `stop` is set, handing every
/// rendered frame and its timestamp to `present`.
///
/// Returns the number of frames presented. Ticks missed while a frame was
/// rendering are skipped, so at most one render is in flight.
pub async fn run_preview<F>(
    driver: &mut PreviewDriver,
    stop: &CancelFlag,
    mut present: F,
) -> ReframeResult<u64>
where
    F: FnMut(&Pixmap, f64),
{
    let started = Instant::now();
    let mut interval = tokio::time::interval(Duration::from_nanos(driver.rate.interval_ns()));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut presented = 0;
    while !stop.is_cancelled() {
        interval.tick().await;
        let now_ns = started.elapsed().as_nanos() as u64;
        if driver.tick(now_ns)? {
            present(driver.surface(), driver.position());
            presented += 1;
        }
    }
    tracing::debug!(presented, "Preview loop stopped");
    Ok(presented)
}
