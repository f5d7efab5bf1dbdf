//! In-memory sources and sinks for pipeline tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tiny_skia::{Color, Pixmap};

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_project_model::{
    Background, CutRegion, FrameStyles, RegionId, ShadowStyle, Size, WebcamStyles,
};
use reframe_render_engine::{FrameRenderer, FrameSink, FrameSource, MediaSources, Scene};

pub const FPS: u32 = 30;
pub const OUTPUT: u32 = 32;
pub const VIDEO: u32 = 16;

/// A source whose frame color encodes the frame index it was seeked to.
pub struct ClockSource {
    duration: f64,
    position: f64,
    frame: Pixmap,
    seeks: Arc<Mutex<Vec<f64>>>,
    fail_at: Option<f64>,
}

impl ClockSource {
    pub fn new(duration: f64, seeks: Arc<Mutex<Vec<f64>>>) -> Self {
        Self {
            duration,
            position: 0.0,
            frame: Pixmap::new(VIDEO, VIDEO).unwrap(),
            seeks,
            fail_at: None,
        }
    }

    /// Fail every seek at or after `time_secs`.
    pub fn failing_at(mut self, time_secs: f64) -> Self {
        self.fail_at = Some(time_secs);
        self
    }
}

impl FrameSource for ClockSource {
    fn duration_secs(&self) -> f64 {
        self.duration
    }

    fn dimensions(&self) -> (u32, u32) {
        (VIDEO, VIDEO)
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn seek(&mut self, time_secs: f64) -> ReframeResult<()> {
        if self.fail_at.is_some_and(|at| time_secs >= at) {
            return Err(ReframeError::render("decoder went away"));
        }
        self.seeks.lock().unwrap().push(time_secs);
        self.position = time_secs.clamp(0.0, self.duration);
        let index = (self.position * FPS as f64).round() as u64;
        let shade = (index % 256) as u8;
        self.frame
            .fill(Color::from_rgba8(shade, 255 - shade, 0, 255));
        Ok(())
    }

    fn frame(&self) -> ReframeResult<&Pixmap> {
        Ok(&self.frame)
    }
}

/// Records every frame it is handed.
#[derive(Default)]
pub struct RecordingSink {
    pub frames: Vec<Vec<u8>>,
    pub finished: bool,
    pub aborted: bool,
    /// Report a fatal error once this many frames were written.
    pub fail_after: Option<usize>,
}

impl FrameSink for RecordingSink {
    fn write_frame(&mut self, rgba: &[u8]) -> ReframeResult<()> {
        assert_eq!(rgba.len(), (OUTPUT * OUTPUT * 4) as usize);
        self.frames.push(rgba.to_vec());
        Ok(())
    }

    fn fatal_error(&mut self) -> Option<String> {
        self.fail_after
            .filter(|n| self.frames.len() >= *n)
            .map(|_| "encoder exited with status 1".to_string())
    }

    fn finish(&mut self) -> ReframeResult<()> {
        self.finished = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
        self.frames.clear();
    }
}

pub fn cut(id: u64, start: f64, duration: f64) -> CutRegion {
    CutRegion {
        id: RegionId(id),
        start_time: start,
        duration,
        trim_type: None,
        z_index: 0,
    }
}

/// Flat scene with no shadows, so renders are cheap and exact.
pub fn plain_scene(cuts: Vec<CutRegion>) -> Scene {
    Scene {
        cut_regions: cuts,
        frame: FrameStyles {
            padding: 10.0,
            background: Background::Color {
                color: "#101010".to_string(),
            },
            border_radius: 0.0,
            border_width: 0.0,
            shadow: ShadowStyle {
                blur: 0.0,
                ..ShadowStyle::default()
            },
        },
        webcam: WebcamStyles {
            visible: false,
            ..WebcamStyles::default()
        },
        video_size: Size::new(VIDEO as f64, VIDEO as f64),
        ..Scene::default()
    }
}

pub fn renderer(cuts: Vec<CutRegion>) -> FrameRenderer {
    FrameRenderer::new(plain_scene(cuts), None, OUTPUT, OUTPUT).unwrap()
}

pub fn sources(duration: f64, seeks: &Arc<Mutex<Vec<f64>>>) -> MediaSources {
    MediaSources::new(Box::new(ClockSource::new(duration, seeks.clone())), None)
}
