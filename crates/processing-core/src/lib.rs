//! Reframe Processing Core
//!
//! Turns editing decisions into per-frame camera state:
//! - **Zoom transform:** Scale, pan, and transform origin for any timestamp
//! - **Cuts:** Which timestamps are removed and where playback resumes
//! - **Auto-Zoom:** Candidate zoom regions from clusters of mouse clicks
//!
//! This crate is pure computation with no I/O.
//! All inputs are data; all outputs are data.

pub mod auto_zoom;
pub mod cut;
pub mod zoom_transform;

pub use auto_zoom::{AutoZoomAnalyzer, AutoZoomConfig};
pub use cut::*;
pub use zoom_transform::*;
