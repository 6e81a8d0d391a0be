use crate::error::UploaderError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// A rendered clip on disk, awaiting upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalClip {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Lists the clips in `dir` with the given extension, sorted by filename.
///
/// With `video_id` set, only files named `{video_id}_...` are kept. A missing
/// directory and an empty result are both errors: a run with nothing to do
/// should be visible to whoever scheduled it.
pub fn list_clips(
    dir: &Path,
    extension: &str,
    video_id: Option<&str>,
) -> Result<Vec<LocalClip>, UploaderError> {
    if !dir.is_dir() {
        error!(dir = %dir.display(), "Clip directory not found");
        return Err(UploaderError::DirectoryNotFound(dir.to_path_buf()));
    }

    let prefix = video_id.map(|id| format!("{id}_"));
    let mut clips = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        // Follows symlinks: staged renders are often links into another tree.
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Ignoring dangling symlink");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            continue;
        }

        // Non UTF-8 names cannot carry the filename micro-format anyway.
        let Some(filename) = entry.file_name().to_str().map(str::to_owned) else {
            debug!(path = %path.display(), "Ignoring non UTF-8 filename");
            continue;
        };

        if !has_extension(&path, extension) {
            continue;
        }
        if let Some(prefix) = &prefix {
            if !filename.starts_with(prefix.as_str()) {
                debug!(filename = %filename, "Ignoring clip of another video");
                continue;
            }
        }

        clips.push(LocalClip {
            filename,
            path,
            size_bytes: metadata.len(),
        });
    }

    if clips.is_empty() {
        error!(dir = %dir.display(), extension, "No clips found to upload");
        return Err(UploaderError::NoClipsFound {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        });
    }

    clips.sort_by(|a, b| a.filename.cmp(&b.filename));
    info!(dir = %dir.display(), count = clips.len(), "Found clips to upload");
    Ok(clips)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
