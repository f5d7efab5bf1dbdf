//! Project metadata and configuration types.
//!
//! A project directory ties together the recorded media, the mouse metadata
//! sidecar, the region timeline and the presentation and export settings:
//!
//! ```text
//! <root>/
//!   sources/            recorded media
//!   meta/project.json   Project
//!   meta/timeline.json  Timeline
//!   exports/            rendered output
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::editor::RegionEditor;
use crate::event::{MetadataError, MouseTrack};
use crate::geometry::{RecordingGeometry, Size};
use crate::style::{FrameStyles, WebcamStyles};
use crate::timeline::{Timeline, TimelineError};

/// Top-level project file (`project.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Schema version.
    pub version: String,

    /// Human-readable project name.
    pub name: String,

    /// Unique project identifier (UUID).
    pub id: String,

    /// Creation timestamp (RFC 3339).
    pub created_at: String,

    /// Last modified timestamp (RFC 3339).
    pub modified_at: String,

    /// Recorded media and metadata.
    #[serde(default)]
    pub sources: Sources,

    /// Screen area that was captured.
    pub recording: RecordingGeometry,

    #[serde(default)]
    pub frame: FrameStyles,

    #[serde(default)]
    pub webcam: WebcamStyles,

    pub export: ExportConfig,
}

/// References to source files (relative to the project root).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sources {
    /// Screen capture video.
    #[serde(default)]
    pub screen: Option<TrackRef>,

    /// Webcam video.
    #[serde(default)]
    pub webcam: Option<TrackRef>,

    /// Mouse metadata sidecar (JSON).
    #[serde(default)]
    pub metadata: Option<String>,
}

/// Reference to a media file with probed metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    /// Relative path from project root to the media file.
    pub path: String,

    /// Duration in seconds, `0` when not probed yet.
    #[serde(default)]
    pub duration_secs: f64,

    /// Pixel width, `0` when not probed yet.
    #[serde(default)]
    pub width: u32,

    /// Pixel height, `0` when not probed yet.
    #[serde(default)]
    pub height: u32,
}

impl TrackRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            duration_secs: 0.0,
            width: 0,
            height: 0,
        }
    }

    /// Probed dimensions, if known.
    pub fn size(&self) -> Option<Size> {
        (self.width > 0 && self.height > 0).then(|| Size::from((self.width, self.height)))
    }
}

/// Export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Output format.
    pub format: ExportFormat,

    /// Output resolution (width x height in pixels).
    pub width: u32,
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// Video bitrate in kbps (0 = encoder default).
    #[serde(default)]
    pub video_bitrate_kbps: u32,
}

/// Output video format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[serde(rename = "mp4-h264")]
    Mp4H264,
    #[serde(rename = "mp4-h265")]
    Mp4H265,
    Gif,
    Webm,
}

impl ExportFormat {
    /// File extension for the container.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Mp4H264 | ExportFormat::Mp4H265 => "mp4",
            ExportFormat::Gif => "gif",
            ExportFormat::Webm => "webm",
        }
    }

    /// Parse the serialized name (`mp4-h264`, `gif`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mp4-h264" | "mp4" => Some(ExportFormat::Mp4H264),
            "mp4-h265" => Some(ExportFormat::Mp4H265),
            "gif" => Some(ExportFormat::Gif),
            "webm" => Some(ExportFormat::Webm),
            _ => None,
        }
    }
}

impl Project {
    /// Create a new project with defaults for a `width` x `height` capture.
    pub fn new(name: impl Into<String>, width: u32, height: u32, fps: u32) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: "1.0".to_string(),
            name: name.into(),
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now.clone(),
            modified_at: now,
            sources: Sources::default(),
            recording: RecordingGeometry::new(0.0, 0.0, width as f64, height as f64),
            frame: FrameStyles::default(),
            webcam: WebcamStyles::default(),
            export: ExportConfig {
                format: ExportFormat::Mp4H264,
                width,
                height,
                fps,
                video_bitrate_kbps: 0,
            },
        }
    }

    /// Known screen video duration in seconds.
    pub fn video_duration(&self) -> Option<f64> {
        self.sources
            .screen
            .as_ref()
            .map(|t| t.duration_secs)
            .filter(|d| d.is_finite() && *d > 0.0)
    }
}

/// The complete in-memory representation of a loaded project.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    /// Filesystem path to the project directory.
    pub root: PathBuf,

    /// Project metadata.
    pub project: Project,

    /// Region timeline.
    pub timeline: Timeline,
}

impl LoadedProject {
    /// Load a project from a directory.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();

        let project_path = root.join("meta").join("project.json");
        let timeline_path = root.join("meta").join("timeline.json");

        let project_json = read_file(&project_path)?;
        let project: Project =
            serde_json::from_str(&project_json).map_err(|e| ProjectError::ParseError {
                path: project_path,
                source: e,
            })?;

        let timeline = if timeline_path.exists() {
            let timeline_json = read_file(&timeline_path)?;
            Timeline::from_json(&timeline_json).map_err(|e| match e {
                TimelineError::Parse(source) => ProjectError::ParseError {
                    path: timeline_path,
                    source,
                },
                TimelineError::Region(e) => ProjectError::ValidationError {
                    message: e.to_string(),
                },
            })?
        } else {
            Timeline::new()
        };

        Ok(Self {
            root,
            project,
            timeline,
        })
    }

    /// Save project and timeline to disk.
    pub fn save(&self) -> Result<(), ProjectError> {
        let meta_dir = self.root.join("meta");
        std::fs::create_dir_all(&meta_dir).map_err(|e| ProjectError::IoError {
            path: meta_dir.clone(),
            source: e,
        })?;

        write_json(&meta_dir.join("project.json"), &self.project)?;
        write_json(&meta_dir.join("timeline.json"), &self.timeline)?;
        Ok(())
    }

    /// Bump `modified_at` to now.
    pub fn touch(&mut self) {
        self.project.modified_at = chrono::Utc::now().to_rfc3339();
    }

    /// Create a new project on disk with the standard directory structure.
    pub fn create(
        root: impl AsRef<Path>,
        name: impl Into<String>,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();

        for subdir in &["sources", "meta", "exports"] {
            std::fs::create_dir_all(root.join(subdir)).map_err(|e| ProjectError::IoError {
                path: root.join(subdir),
                source: e,
            })?;
        }

        let loaded = Self {
            root,
            project: Project::new(name, width, height, fps),
            timeline: Timeline::new(),
        };
        loaded.save()?;
        Ok(loaded)
    }

    /// Resolve a project-relative path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Validate that all referenced source files exist.
    pub fn validate_sources(&self) -> Vec<String> {
        let mut errors = vec![];

        let check_track = |track: &Option<TrackRef>, label: &str, errors: &mut Vec<String>| {
            if let Some(t) = track {
                if !self.resolve(&t.path).exists() {
                    errors.push(format!("{label} source missing: {}", t.path));
                }
            }
        };

        check_track(&self.project.sources.screen, "Screen", &mut errors);
        check_track(&self.project.sources.webcam, "Webcam", &mut errors);

        if self.project.sources.screen.is_none() {
            errors.push("No screen source configured".to_string());
        }

        if let Some(metadata) = &self.project.sources.metadata {
            if !self.resolve(metadata).exists() {
                errors.push(format!("Mouse metadata missing: {metadata}"));
            }
        }

        errors
    }

    /// Load the mouse metadata sidecar. A project without one yields an
    /// empty track.
    pub fn load_mouse_track(&self) -> Result<MouseTrack, ProjectError> {
        let Some(relative) = &self.project.sources.metadata else {
            return Ok(MouseTrack::default());
        };
        let path = self.resolve(relative);
        let json = read_file(&path)?;
        MouseTrack::from_json(&json).map_err(|source| ProjectError::MetadataError { path, source })
    }

    /// A region editor over a copy of the timeline, with the video duration
    /// applied when it is known.
    pub fn editor(&self) -> RegionEditor {
        let mut editor = RegionEditor::new(self.timeline.clone());
        if let Some(duration) = self.project.video_duration() {
            editor.set_video_duration(duration);
        }
        editor
    }
}

fn read_file(path: &Path) -> Result<String, ProjectError> {
    std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ProjectError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, json).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Bad mouse metadata in {path}: {source}")]
    MetadataError {
        path: PathBuf,
        source: MetadataError,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}
