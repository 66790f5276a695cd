//! Upload session routes
//!
//! Endpoints:
//! - POST /api/v1/uploads/session - Mint an upload session plan
//! - DELETE /api/v1/uploads/:session_id - Discard an abandoned session's objects

use axum::{
    extract::{Path, State},
    routing::{delete, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::AppError;
use crate::session::{is_valid_session_id, SessionManager, StartSessionRequest, UploadSession};
use crate::state::AppState;
use crate::storage::S3Client;

// ============================================================================
// State
// ============================================================================

/// Upload-specific state
#[derive(Clone)]
pub struct UploadsState {
    pub sessions: SessionManager,
    pub s3_client: S3Client,
}

// ============================================================================
// Router
// ============================================================================

/// Create the uploads router
pub fn router(state: UploadsState) -> Router<AppState> {
    Router::new()
        .route("/session", post(start_session))
        .route("/:session_id", delete(discard_session))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/uploads/session
///
/// Mint one upload grant per requested file and return the full plan. Rejects
/// empty file lists and malformed session ids before any grant is issued.
async fn start_session(
    State(state): State<UploadsState>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Json<UploadSession>, AppError> {
    let session = state
        .sessions
        .start_session(request.session_id.as_deref(), &request.files)
        .await?;

    Ok(Json(session))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiscardResponse {
    session_id: String,
    objects_deleted: usize,
}

/// DELETE /api/v1/uploads/:session_id
///
/// Remove every object uploaded under a session's namespace prefix. Used when
/// a build is abandoned before its manifest is written.
async fn discard_session(
    State(state): State<UploadsState>,
    Path(session_id): Path<String>,
) -> Result<Json<DiscardResponse>, AppError> {
    if !is_valid_session_id(&session_id) {
        return Err(AppError::BadRequest(format!(
            "Invalid session id: {}",
            session_id
        )));
    }

    let prefix = format!("{}/{}/", state.sessions.namespace(), session_id);
    let objects_deleted = state.s3_client.delete_objects_with_prefix(&prefix).await?;

    tracing::info!(
        session_id = %session_id,
        objects_deleted = objects_deleted,
        "Discarded abandoned session"
    );

    Ok(Json(DiscardResponse {
        session_id,
        objects_deleted,
    }))
}
