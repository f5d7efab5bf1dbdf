//! Reframe Render Engine
//!
//! Composites a screen recording into a styled, zoomed output frame and
//! drives it either as a live preview or as an offline export.
//!
//! # Pipeline
//!
//! ```text
//! screen video ──┐
//!                ├── zoom/pan transform (zoom regions + mouse track)
//! mouse track ───┘         │
//!                          ├── background, frame chrome, shadow
//! webcam video ────────────┤
//!                          ├── webcam overlay
//!                          ▼
//!                   RGBA frame ── skip cuts ──► encoder (ffmpeg stdin)
//! ```
//!
//! The same [`compositor::draw_scene`] call backs both the preview driver
//! and the exporter, so an exported frame matches the preview at the same
//! timestamp.

pub mod assets;
pub mod background;
pub mod color;
pub mod compositor;
pub mod export;
pub mod ffmpeg;
pub mod layout;
pub mod playback;
pub mod reorder;
pub mod shadow;
pub mod source;
pub mod transform;

pub use compositor::{draw_scene, frame_to_rgba, FrameRenderer, Scene};
pub use export::*;
pub use playback::{run_preview, PreviewDriver};
pub use reorder::{export_frames_parallel, ReorderBuffer};
pub use source::{FrameSink, FrameSource, MediaSources};
pub use transform::{PlaneTransform, TransformStep};
