//! Interfaces to the two external collaborators of an upload run: the
//! object store holding clip bytes and the database holding one row per clip.
//!
//! Both traits are annotated for `mockall`, so the upload loop can be driven
//! end to end in tests without a bucket or a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

use mockall::automock;

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;
pub type RepositoryError = Box<dyn std::error::Error + Send + Sync>;

/// A single object write. The implementor streams the bytes from `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct PutObject {
    pub key: String,
    pub path: PathBuf,
    pub content_type: String,
    /// User metadata attached to the object.
    pub metadata: HashMap<String, String>,
}

/// What a HEAD request tells us about a stored object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub size_bytes: Option<u64>,
    pub content_type: Option<String>,
}

/// A row of the `videos` table.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    pub id: i32,
    /// Unique clip identifier.
    pub video_id: String,
    pub filename: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<f64>,
    pub r2_url: Option<String>,
    pub r2_key: Option<String>,
}

impl VideoRecord {
    /// Whether a previous run already finished this clip.
    pub fn is_uploaded(&self) -> bool {
        self.r2_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

/// Insert payload for a clip seen for the first time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideoRecord {
    pub video_id: String,
    pub filename: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub r2_url: String,
    pub r2_key: String,
}

/// Object storage operations used by the upload loop.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload one object. Success means the write call itself succeeded.
    async fn put_object(&self, req: PutObject) -> Result<(), StoreError>;

    /// Look up an object. `Ok(None)` means it does not exist.
    async fn head_object(&self, key: &str) -> Result<Option<ObjectInfo>, StoreError>;
}

/// Persistence for clip rows, keyed on the unique clip identifier.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn find_by_video_id(&self, video_id: &str)
        -> Result<Option<VideoRecord>, RepositoryError>;

    /// Insert `record`, or, when `existing` is given, refresh that row's
    /// storage URL, key and update timestamp.
    ///
    /// Must be atomic: on error nothing of this call is persisted.
    async fn upsert(
        &self,
        existing: Option<VideoRecord>,
        record: NewVideoRecord,
    ) -> Result<(), RepositoryError>;

    /// Release the underlying connection(s). Called once, after the loop.
    async fn close(&self);
}
