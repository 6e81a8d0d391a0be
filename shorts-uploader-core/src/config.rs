use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_EXTENSION: &str = "mp4";

/// How storage keys are derived from a clip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyLayout {
    /// `videos/{filename}`
    #[default]
    Flat,
    /// `{video_id}/{filename}`
    PerVideo,
}

impl KeyLayout {
    pub fn storage_key(&self, video_id: &str, filename: &str) -> String {
        match self {
            KeyLayout::Flat => format!("videos/{filename}"),
            KeyLayout::PerVideo => format!("{video_id}/{filename}"),
        }
    }
}

/// Everything the upload run needs besides the store and repository clients.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Parent video targeted by this run.
    pub video_id: String,
    pub shorts_dir: PathBuf,
    /// Clip extension without the leading dot.
    pub extension: String,
    /// Only enumerate files named `{video_id}_...`.
    pub only_target_video: bool,
    /// Analysis sidecar; `None` means no segment metadata at all.
    pub sidecar_path: Option<PathBuf>,
    pub key_layout: KeyLayout,
    pub verify_uploads: bool,
    /// Prefix joined with the storage key to form the public URL.
    pub url_base: String,
}

impl UploadSettings {
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_base, key.trim_start_matches('/'))
    }

    pub fn content_type(&self) -> &'static str {
        content_type_for(&self.extension)
    }

    pub fn trace_loaded(&self) {
        info!(
            video_id = %self.video_id,
            shorts_dir = %self.shorts_dir.display(),
            extension = %self.extension,
            sidecar = ?self.sidecar_path,
            key_layout = ?self.key_layout,
            verify_uploads = self.verify_uploads,
            "Loaded upload settings"
        );
        debug!(?self, "Upload settings (full debug)");
    }
}

/// Public URL prefix: the configured public URL if any, otherwise the
/// path-style `{endpoint}/{bucket}`.
pub fn public_url_base(public_url: Option<&str>, endpoint: &str, bucket: &str) -> String {
    match public_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
    }
}

pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}
