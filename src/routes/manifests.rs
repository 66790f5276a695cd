//! Manifest routes
//!
//! Endpoints:
//! - POST /api/v1/manifests/:session_id - Export a manifest next to its objects

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::error::AppError;
use crate::manifest::{Manifest, ManifestExporter, ObjectStorageExporter};
use crate::state::AppState;

/// Create the manifests router
pub fn router() -> Router<AppState> {
    Router::new().route("/:session_id", post(export_manifest))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportResponse {
    location: String,
    bytes_written: usize,
}

/// POST /api/v1/manifests/:session_id
///
/// Write the posted manifest JSON into object storage adjacent to the
/// session's uploaded objects and return its storage URI. The manifest's
/// declared session must match the path, and every object key the manifest
/// claims must already exist, so a partially uploaded session cannot commit.
async fn export_manifest(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(manifest): Json<Manifest>,
) -> Result<Json<ExportResponse>, AppError> {
    if manifest.storage.session_id != session_id {
        return Err(AppError::BadRequest(format!(
            "Manifest session '{}' does not match path '{}'",
            manifest.storage.session_id, session_id
        )));
    }

    for entry in &manifest.files {
        let Some(key) = entry.object_key.as_deref() else {
            continue;
        };
        if !state.s3_client().object_exists(key).await? {
            return Err(AppError::BadRequest(format!(
                "Manifest references '{}' but no object was uploaded under {}",
                entry.relative_path, key
            )));
        }
    }

    let exporter = ObjectStorageExporter::new(state.s3_client().clone());
    let receipt = exporter
        .export(&manifest)
        .await
        .map_err(|e| match e {
            crate::manifest::ExportError::Storage(s) => AppError::Storage(s),
            other => AppError::Internal(other.to_string()),
        })?;

    Ok(Json(ExportResponse {
        location: receipt.location,
        bytes_written: receipt.bytes_written,
    }))
}
