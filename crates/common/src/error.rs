//! Error types shared across Reframe crates.

use std::path::PathBuf;

/// Top-level error type for Reframe operations.
#[derive(Debug, thiserror::Error)]
pub enum ReframeError {
    #[error("Region error: {message}")]
    Region { message: String },

    #[error("Metadata error: {message}")]
    Metadata { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    /// A failure inside the export pipeline. `stage` names the phase
    /// that failed (for example `seeking`, `rendering`, `encoding`).
    #[error("Export failed while {stage}: {message}")]
    Export {
        stage: &'static str,
        message: String,
    },

    #[error("Export cancelled before frame {frame}")]
    Cancelled { frame: u64 },

    #[error("Project error: {message}")]
    Project { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReframeError.
pub type ReframeResult<T> = Result<T, ReframeError>;

impl ReframeError {
    pub fn region(msg: impl Into<String>) -> Self {
        Self::Region {
            message: msg.into(),
        }
    }

    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn export(stage: &'static str, msg: impl Into<String>) -> Self {
        Self::Export {
            stage,
            message: msg.into(),
        }
    }

    pub fn project(msg: impl Into<String>) -> Self {
        Self::Project {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether the error came from a user-requested cancellation rather
    /// than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The export stage that failed, if this is an export error.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Self::Export { stage, .. } => Some(*stage),
            Self::Cancelled { .. } => Some("cancelled"),
            _ => None,
        }
    }
}
