//! Collaborator traits at the edges of the render pipeline.

use tiny_skia::Pixmap;

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_project_model::Size;

/// A seekable video stream that presents one frame at a time.
pub trait FrameSource: Send {
    /// Stream duration in seconds.
    fn duration_secs(&self) -> f64;

    /// Native pixel dimensions `(width, height)`.
    fn dimensions(&self) -> (u32, u32);

    /// Timestamp of the frame currently presented.
    fn current_time(&self) -> f64;

    /// Move to `time_secs`. When this returns, [`FrameSource::frame`]
    /// presents the frame at that time.
    fn seek(&mut self, time_secs: f64) -> ReframeResult<()>;

    /// The frame at the current position.
    fn frame(&self) -> ReframeResult<&Pixmap>;

    fn size(&self) -> Size {
        self.dimensions().into()
    }
}

/// A streaming consumer of serialized RGBA frames, such as an encoder.
///
/// Frames must arrive in presentation order.
pub trait FrameSink: Send {
    /// Accept one frame of `width * height * 4` bytes.
    fn write_frame(&mut self, rgba: &[u8]) -> ReframeResult<()>;

    /// A failure the sink hit asynchronously, such as the encoder exiting.
    /// Checked between frames.
    fn fatal_error(&mut self) -> Option<String>;

    /// Flush and close after the last frame.
    fn finish(&mut self) -> ReframeResult<()>;

    /// Stop and discard partial output.
    fn abort(&mut self);
}

/// The main video plus the optional webcam stream.
pub struct MediaSources {
    pub video: Box<dyn FrameSource>,
    pub webcam: Option<Box<dyn FrameSource>>,
}

impl MediaSources {
    pub fn new(video: Box<dyn FrameSource>, webcam: Option<Box<dyn FrameSource>>) -> Self {
        Self { video, webcam }
    }

    /// Seek every stream to `time_secs`. Errors name the stream that failed.
    pub fn seek_all(&mut self, time_secs: f64) -> ReframeResult<()> {
        self.video.seek(time_secs).map_err(|e| {
            ReframeError::export("seeking", format!("screen video at {time_secs:.3}s: {e}"))
        })?;
        if let Some(webcam) = &mut self.webcam {
            webcam.seek(time_secs).map_err(|e| {
                ReframeError::export("seeking", format!("webcam video at {time_secs:.3}s: {e}"))
            })?;
        }
        Ok(())
    }

    pub fn duration_secs(&self) -> f64 {
        self.video.duration_secs()
    }
}
