#![doc = "R2 implementation of the core `ObjectStore` contract, on top of the S3 SDK."]

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use shorts_uploader_core::contract::{ObjectInfo, ObjectStore, PutObject, StoreError};

use crate::load_config::StorageConfig;

pub struct R2Store {
    client: Client,
    bucket: String,
}

impl R2Store {
    /// Builds the client from static credentials. No request is made here.
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "static",
        );

        let s3_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        tracing::info!(
            endpoint = %config.endpoint,
            bucket = %config.bucket,
            region = %config.region,
            "Initialised object store client"
        );

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for R2Store {
    async fn put_object(&self, req: PutObject) -> Result<(), StoreError> {
        let body = ByteStream::from_path(&req.path).await.map_err(|e| {
            tracing::error!(path = %req.path.display(), error = ?e, "Failed to open clip for upload");
            e
        })?;

        tracing::debug!(key = %req.key, bucket = %self.bucket, "Putting object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&req.key)
            .content_type(&req.content_type)
            .set_metadata(Some(req.metadata))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                tracing::error!(key = %req.key, error = %message, "PutObject failed");
                StoreError::from(message)
            })?;

        Ok(())
    }

    async fn head_object(&self, key: &str) -> Result<Option<ObjectInfo>, StoreError> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => Ok(Some(ObjectInfo {
                size_bytes: output
                    .content_length()
                    .and_then(|len| u64::try_from(len).ok()),
                content_type: output.content_type().map(str::to_owned),
            })),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(None),
            Err(e) => Err(DisplayErrorContext(&e).to_string().into()),
        }
    }
}
