//! S3-compatible storage client
//!
//! Wraps the AWS SDK for S3-compatible storage access, including presigned
//! PUT URL issuance for upload grants.

use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    presigning::PresigningConfig,
    primitives::ByteStream,
    Client,
};
use chrono::{DateTime, Utc};

use crate::config::StorageConfig;
use crate::error::StorageError;

use super::types::{ObjectMetadata, PresignedPut};

/// S3-compatible storage client
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
}

impl S3Client {
    /// Create a new S3 client from configuration
    pub async fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "arkvault",
        );

        let region = config
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(Region::new(region))
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO and other S3-compatible services
            .build();

        let client = Client::from_conf(s3_config);

        // Test connection by checking if bucket exists
        let bucket = config.bucket.clone();
        match client.head_bucket().bucket(&bucket).send().await {
            Ok(_) => {
                tracing::info!("Connected to S3 bucket: {}", bucket);
            }
            Err(e) => {
                tracing::warn!(
                    "Could not verify bucket {}: {}. Will attempt operations anyway.",
                    bucket,
                    e
                );
            }
        }

        Ok(Self { client, bucket })
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Canonical storage URI for a key in this bucket
    pub fn storage_uri(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    /// Mint a presigned PUT URL for an object key.
    ///
    /// The URL authorizes exactly one destination key with a fixed content
    /// type; expiry is the sole validity boundary.
    pub async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedPut, StorageError> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(|e| {
            StorageError::SdkError(format!("Invalid presigning TTL {:?}: {}", ttl, e))
        })?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| {
                StorageError::SdkError(format!("Failed to presign PUT for {}: {}", key, e))
            })?;

        Ok(PresignedPut {
            url: request.uri().to_string(),
            expires_at: Utc::now()
                + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero()),
        })
    }

    /// Put an object's bytes directly (used for manifest export)
    pub async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                StorageError::SdkError(format!("Failed to put object {}: {}", key, e))
            })?;

        Ok(())
    }

    /// Get object metadata (HEAD request)
    pub async fn head_object(&self, key: &str) -> Result<ObjectMetadata, StorageError> {
        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("404") || e.to_string().contains("NoSuchKey") {
                    StorageError::ObjectNotFound(key.to_string())
                } else {
                    StorageError::SdkError(format!("Failed to head object {}: {}", key, e))
                }
            })?;

        Ok(ObjectMetadata {
            key: key.to_string(),
            size: response.content_length().unwrap_or(0),
            last_modified: response
                .last_modified()
                .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())),
            content_type: response.content_type().map(|s| s.to_string()),
            etag: response.e_tag().map(|s| s.to_string()),
        })
    }

    /// Check if an object exists
    pub async fn object_exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.head_object(key).await {
            Ok(_) => Ok(true),
            Err(StorageError::ObjectNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete every object under a key prefix.
    ///
    /// Used to discard an abandoned session's uploads. Returns the number of
    /// objects removed.
    pub async fn delete_objects_with_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let mut deleted = 0;
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .max_keys(1000);

            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|e| {
                StorageError::SdkError(format!("Failed to list objects under {}: {}", prefix, e))
            })?;

            for object in response.contents() {
                let Some(key) = object.key() else { continue };
                self.client
                    .delete_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|e| {
                        StorageError::SdkError(format!("Failed to delete object {}: {}", key, e))
                    })?;
                deleted += 1;
            }

            if !response.is_truncated().unwrap_or(false) {
                break;
            }
            continuation_token = response.next_continuation_token().map(|s| s.to_string());
        }

        if deleted > 0 {
            tracing::info!(prefix = %prefix, count = deleted, "Deleted objects under prefix");
        }

        Ok(deleted)
    }
}
