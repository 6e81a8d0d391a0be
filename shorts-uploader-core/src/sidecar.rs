//! The analysis sidecar: `{dir}/{video_id}/{video_id}_analysis.json`,
//! written by the analysis step that also chose the segments.

use crate::clip::SegmentMetadata;
use crate::error::UploaderError;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct Analysis {
    #[serde(default)]
    segments: Vec<SegmentMetadata>,
}

pub fn sidecar_path(dir: &Path, video_id: &str) -> PathBuf {
    dir.join(video_id).join(format!("{video_id}_analysis.json"))
}

/// Reads the segment list from a sidecar.
///
/// A missing file yields no segments (clips then get zero duration and no
/// description). A file that exists but cannot be read or parsed is fatal.
pub fn load_segments(path: &Path) -> Result<Vec<SegmentMetadata>, UploaderError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Analysis sidecar not found, continuing without segment metadata");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(UploaderError::Sidecar {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    let analysis: Analysis =
        serde_json::from_str(&content).map_err(|e| UploaderError::Sidecar {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    info!(path = %path.display(), segments = analysis.segments.len(), "Loaded analysis sidecar");
    Ok(analysis.segments)
}
