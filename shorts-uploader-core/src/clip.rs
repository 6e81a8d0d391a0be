//! Clip filename micro-format and metadata resolution.
//!
//! Rendered clips are named `{video_id}_{title tokens...}_{segment}.{ext}`.
//! Everything here is pure: no filesystem access, so the parsing rules can be
//! exercised in isolation from the upload loop.

use crate::error::ClipError;
use serde::{Deserialize, Serialize};

const SEPARATOR: char = '_';

/// A parsed clip filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipName {
    pub video_id: String,
    /// Interior tokens joined with spaces.
    pub title: String,
    /// 1-based segment index.
    pub segment: u32,
    /// The segment token exactly as written in the filename (e.g. `"007"`).
    pub segment_label: String,
}

/// One analysed segment of the parent video, as written by the analysis step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub description: String,
}

/// Everything the database row needs that can be derived before uploading.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipMetadata {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub segment: u32,
    pub segment_label: String,
}

impl ClipMetadata {
    /// Unique key of the clip's database row.
    pub fn clip_id(&self) -> String {
        clip_id(&self.video_id, &self.segment_label)
    }
}

pub fn clip_id(video_id: &str, segment_label: &str) -> String {
    format!("{video_id}_short_{segment_label}")
}

/// Splits a clip filename into video id, title and segment.
///
/// The extension is matched case-insensitively and may be absent. Fewer than
/// three `_`-separated tokens, an empty video id or a non-numeric segment
/// token is a [`ClipError::Parse`].
pub fn parse_clip_filename(filename: &str, extension: &str) -> Result<ClipName, ClipError> {
    let stem = strip_extension(filename, extension);

    let tokens: Vec<&str> = stem.split(SEPARATOR).collect();
    if tokens.len() < 3 {
        return Err(ClipError::parse(
            filename,
            format!("expected at least 3 '_'-separated tokens, got {}", tokens.len()),
        ));
    }

    let video_id = tokens[0];
    if video_id.is_empty() {
        return Err(ClipError::parse(filename, "empty video id"));
    }

    let segment_label = tokens[tokens.len() - 1];
    let segment = segment_label.parse::<u32>().map_err(|e| {
        ClipError::parse(filename, format!("segment {segment_label:?} is not a number: {e}"))
    })?;

    let title = tokens[1..tokens.len() - 1].join(" ");

    Ok(ClipName {
        video_id: video_id.to_string(),
        title,
        segment,
        segment_label: segment_label.to_string(),
    })
}

/// Parses the filename and joins it with the matching analysed segment.
///
/// A segment index outside `1..=segments.len()` is not an error: duration
/// falls back to `0.0` and description to an empty string.
pub fn resolve_metadata(
    filename: &str,
    extension: &str,
    segments: &[SegmentMetadata],
) -> Result<ClipMetadata, ClipError> {
    let name = parse_clip_filename(filename, extension)?;

    let (description, duration) = match segment_for(segments, name.segment) {
        Some(seg) => (seg.description.clone(), seg.end - seg.start),
        None => (String::new(), 0.0),
    };

    Ok(ClipMetadata {
        video_id: name.video_id,
        title: name.title,
        description,
        duration,
        segment: name.segment,
        segment_label: name.segment_label,
    })
}

fn segment_for(segments: &[SegmentMetadata], segment: u32) -> Option<&SegmentMetadata> {
    let index = (segment as usize).checked_sub(1)?;
    segments.get(index)
}

fn strip_extension<'a>(filename: &'a str, extension: &str) -> &'a str {
    let suffix_len = extension.len() + 1;
    if filename.len() > suffix_len && filename.is_char_boundary(filename.len() - suffix_len) {
        let (stem, suffix) = filename.split_at(filename.len() - suffix_len);
        if suffix.starts_with('.') && suffix[1..].eq_ignore_ascii_case(extension) {
            return stem;
        }
    }
    filename
}
