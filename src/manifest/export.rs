//! Manifest export
//!
//! A manifest leaves the build as a self-contained JSON document, either
//! written to a local directory (download flow) or PUT into object storage
//! next to the uploaded files.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::storage::S3Client;

use super::types::Manifest;

/// Where an exported manifest landed
#[derive(Debug, Clone)]
pub struct ExportReceipt {
    /// Local path or storage URI of the written document
    pub location: String,

    /// Size of the serialized document
    pub bytes_written: usize,
}

/// Export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write manifest to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to store manifest: {0}")]
    Storage(#[from] StorageError),
}

/// Sink for assembled manifests
#[async_trait]
pub trait ManifestExporter: Send + Sync {
    async fn export(&self, manifest: &Manifest) -> Result<ExportReceipt, ExportError>;
}

// ============================================================================
// Local Export
// ============================================================================

/// Writes manifests into a local directory, one file per revision
pub struct LocalExporter {
    dir: PathBuf,
}

impl LocalExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ManifestExporter for LocalExporter {
    async fn export(&self, manifest: &Manifest) -> Result<ExportReceipt, ExportError> {
        let json = manifest.to_json()?;
        let path = self.dir.join(format!(
            "{}-r{}.manifest.json",
            manifest.archive_id, manifest.revision
        ));

        let io_err = |source| ExportError::Io {
            path: path.clone(),
            source,
        };
        tokio::fs::create_dir_all(&self.dir).await.map_err(|source| ExportError::Io {
            path: self.dir.clone(),
            source,
        })?;
        tokio::fs::write(&path, json.as_bytes()).await.map_err(io_err)?;

        tracing::info!(path = %path.display(), "Exported manifest locally");

        Ok(ExportReceipt {
            location: path.display().to_string(),
            bytes_written: json.len(),
        })
    }
}

// ============================================================================
// Object Storage Export
// ============================================================================

/// PUTs manifests into the bucket next to the session's uploaded objects,
/// under `<namespace>/<sessionId>/manifest.json`
pub struct ObjectStorageExporter {
    s3: S3Client,
}

impl ObjectStorageExporter {
    pub fn new(s3: S3Client) -> Self {
        Self { s3 }
    }

    fn manifest_key(manifest: &Manifest) -> String {
        format!(
            "{}/{}/manifest.json",
            manifest.storage.namespace, manifest.storage.session_id
        )
    }
}

#[async_trait]
impl ManifestExporter for ObjectStorageExporter {
    async fn export(&self, manifest: &Manifest) -> Result<ExportReceipt, ExportError> {
        let json = manifest.to_json()?;
        let key = Self::manifest_key(manifest);

        self.s3
            .put_object(&key, json.clone().into_bytes(), "application/json")
            .await?;

        let location = self.s3.storage_uri(&key);
        tracing::info!(
            archive_id = %manifest.archive_id,
            location = %location,
            "Exported manifest to object storage"
        );

        Ok(ExportReceipt {
            location,
            bytes_written: json.len(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
