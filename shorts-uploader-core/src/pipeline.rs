//! High-level run: enumerate → resolve metadata → upload → upsert → report.
//!
//! Clips are processed strictly one after another. Each clip ends up in
//! exactly one of three buckets of the [`UploadReport`]:
//!   - **skipped**: its filename does not parse, or its database row already
//!     carries a storage URL from an earlier run
//!   - **failed**: the lookup, the upload or the database write returned an error
//!   - **uploaded**: bytes stored and row inserted or refreshed
//!
//! # Error Handling
//! Only [`collect_inputs`] can abort a run ([`UploaderError`]).
//! Everything that goes wrong for a single clip is a [`ClipError`], recorded
//! in the report, and the loop carries on with the next clip.
//!
//! # Navigation
//! - Entrypoints: [`collect_inputs`], then [`run_upload`]
//! - The loop alone, for callers that already enumerated: [`upload_clips`]

use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::clip::{resolve_metadata, ClipMetadata, SegmentMetadata};
use crate::config::UploadSettings;
use crate::contract::{NewVideoRecord, ObjectStore, PutObject, VideoRepository};
use crate::enumerate::{list_clips, LocalClip};
use crate::error::{ClipError, UploaderError};
use crate::report::{ClipOutcome, UploadReport};
use crate::sidecar::load_segments;

/// Local inputs of a run, gathered before any client is touched.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub clips: Vec<LocalClip>,
    pub segments: Vec<SegmentMetadata>,
}

/// Enumerates clips and loads the sidecar. Fails fast when there is
/// nothing to upload.
pub fn collect_inputs(settings: &UploadSettings) -> Result<RunInputs, UploaderError> {
    settings.trace_loaded();

    let scope = settings
        .only_target_video
        .then_some(settings.video_id.as_str());
    let clips = list_clips(&settings.shorts_dir, &settings.extension, scope)?;

    let segments = match &settings.sidecar_path {
        Some(path) => load_segments(path)?,
        None => Vec::new(),
    };

    Ok(RunInputs { clips, segments })
}

/// Processes every clip, then closes the repository whatever happened to
/// individual clips.
pub async fn run_upload<S, R>(
    settings: &UploadSettings,
    inputs: &RunInputs,
    store: &S,
    repo: &R,
) -> UploadReport
where
    S: ObjectStore + ?Sized,
    R: VideoRepository + ?Sized,
{
    let report = upload_clips(settings, &inputs.clips, &inputs.segments, store, repo).await;
    repo.close().await;

    report.log_summary();
    report
}

/// The per-clip loop. Never aborts early.
pub async fn upload_clips<S, R>(
    settings: &UploadSettings,
    clips: &[LocalClip],
    segments: &[SegmentMetadata],
    store: &S,
    repo: &R,
) -> UploadReport
where
    S: ObjectStore + ?Sized,
    R: VideoRepository + ?Sized,
{
    let mut report = UploadReport::default();

    for clip in clips {
        info!(filename = %clip.filename, "[UPLOAD] Processing clip");
        let outcome = match upload_clip(settings, clip, segments, store, repo).await {
            Ok(outcome) => outcome,
            Err(e @ ClipError::Parse { .. }) => {
                warn!(filename = %clip.filename, error = %e, "[UPLOAD] Could not parse filename, skipping");
                ClipOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                error!(filename = %clip.filename, error = %e, "[UPLOAD][ERROR] Clip failed");
                ClipOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        report.record(clip.filename.clone(), outcome);
    }

    report
}

async fn upload_clip<S, R>(
    settings: &UploadSettings,
    clip: &LocalClip,
    segments: &[SegmentMetadata],
    store: &S,
    repo: &R,
) -> Result<ClipOutcome, ClipError>
where
    S: ObjectStore + ?Sized,
    R: VideoRepository + ?Sized,
{
    let meta = resolve_metadata(&clip.filename, &settings.extension, segments)?;
    let clip_id = meta.clip_id();
    let key = settings
        .key_layout
        .storage_key(&meta.video_id, &clip.filename);

    let existing = repo
        .find_by_video_id(&clip_id)
        .await
        .map_err(|e| ClipError::Lookup {
            clip_id: clip_id.clone(),
            reason: e.to_string(),
        })?;

    if let Some(record) = existing.as_ref().filter(|r| r.is_uploaded()) {
        info!(clip_id = %clip_id, url = ?record.r2_url, "[UPLOAD] Already uploaded, skipping");
        return Ok(ClipOutcome::Skipped {
            reason: format!("{clip_id} already uploaded"),
        });
    }

    store
        .put_object(put_request(settings, clip, &meta, &key))
        .await
        .map_err(|e| ClipError::Upload {
            key: key.clone(),
            reason: e.to_string(),
        })?;
    info!(
        key = %key,
        size_mb = %format!("{:.2}", clip.size_bytes as f64 / (1024.0 * 1024.0)),
        "[UPLOAD] Uploaded to object store"
    );

    if settings.verify_uploads {
        verify_upload(store, &key, clip.size_bytes).await;
    }

    let url = settings.public_url(&key);
    let updating = existing.is_some();
    let record = NewVideoRecord {
        video_id: clip_id.clone(),
        filename: clip.filename.clone(),
        title: meta.title,
        description: meta.description,
        duration: meta.duration,
        r2_url: url.clone(),
        r2_key: key,
    };

    repo.upsert(existing, record)
        .await
        .map_err(|e| ClipError::Persistence {
            clip_id: clip_id.clone(),
            reason: e.to_string(),
        })?;

    if updating {
        info!(clip_id = %clip_id, "[UPLOAD] Updated in database");
    } else {
        info!(clip_id = %clip_id, "[UPLOAD] Added to database");
    }

    Ok(ClipOutcome::Uploaded { clip_id, url })
}

fn put_request(
    settings: &UploadSettings,
    clip: &LocalClip,
    meta: &ClipMetadata,
    key: &str,
) -> PutObject {
    let metadata = HashMap::from([
        ("video-id".to_string(), meta.video_id.clone()),
        ("filename".to_string(), clip.filename.clone()),
    ]);
    PutObject {
        key: key.to_string(),
        path: clip.path.clone(),
        content_type: settings.content_type().to_string(),
        metadata,
    }
}

/// Post-upload existence check. Only ever warns.
async fn verify_upload<S>(store: &S, key: &str, expected_size: u64)
where
    S: ObjectStore + ?Sized,
{
    match store.head_object(key).await {
        Ok(Some(object)) => match object.size_bytes {
            Some(size) if size != expected_size => {
                warn!(key, size, expected_size, "[UPLOAD][VERIFY] Stored object size differs from local file")
            }
            _ => debug!(key, "[UPLOAD][VERIFY] Object present"),
        },
        Ok(None) => warn!(key, "[UPLOAD][VERIFY] Object not found after upload"),
        Err(e) => warn!(key, error = %e, "[UPLOAD][VERIFY] Verification request failed"),
    }
}
