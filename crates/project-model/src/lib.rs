//! Reframe Project Model
//!
//! Defines the core data contracts for Reframe projects:
//! - **Easing:** The closed set of transition curves used by zoom regions
//! - **Regions:** Zoom and cut directives anchored to the timeline
//! - **Editor:** The region store and the operations that mutate it
//! - **Events:** Recorded mouse telemetry with time-ordered lookup
//! - **Styles:** Frame, background, and webcam presentation settings
//! - **Project:** Top-level metadata, sources, and export configuration
//!
//! Zoom targets are normalized to `[-0.5, 0.5]` relative to the frame
//! centre; recorded mouse positions stay in capture-area pixels.

pub mod easing;
pub mod editor;
pub mod event;
pub mod geometry;
pub mod project;
pub mod region;
pub mod style;
pub mod timeline;

pub use easing::*;
pub use editor::*;
pub use event::*;
pub use geometry::*;
pub use project::*;
pub use region::*;
pub use style::*;
pub use timeline::*;
