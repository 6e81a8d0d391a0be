//! Error taxonomy for an upload run.
//!
//! [`UploaderError`] covers everything that aborts a run before the
//! upload loop starts. [`ClipError`] is scoped to a single clip: the loop
//! catches it, records the clip as skipped or failed and moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Any of these ends the run with a non-zero exit status.
#[derive(Debug, Error)]
pub enum UploaderError {
    #[error("missing required configuration: {}", missing.join(", "))]
    Configuration { missing: Vec<String> },

    #[error("invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("clip directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("nothing to upload: no .{extension} clips found in {}", dir.display())]
    NoClipsFound { dir: PathBuf, extension: String },

    #[error("failed to load analysis sidecar {}: {reason}", path.display())]
    Sidecar { path: PathBuf, reason: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recoverable, per-clip errors.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("unparseable clip filename {filename:?}: {reason}")]
    Parse { filename: String, reason: String },

    #[error("database lookup failed for {clip_id}: {reason}")]
    Lookup { clip_id: String, reason: String },

    #[error("upload of {key} failed: {reason}")]
    Upload { key: String, reason: String },

    #[error("database write failed for {clip_id}: {reason}")]
    Persistence { clip_id: String, reason: String },
}

impl ClipError {
    pub(crate) fn parse(filename: &str, reason: impl Into<String>) -> Self {
        ClipError::Parse {
            filename: filename.to_string(),
            reason: reason.into(),
        }
    }
}
