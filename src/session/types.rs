//! Upload session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Default grant lifetime: 30 minutes
pub const DEFAULT_GRANT_TTL_SECS: u64 = 30 * 60;

/// Session id length bounds for client-supplied ids
pub const SESSION_ID_MIN_LEN: usize = 6;
pub const SESSION_ID_MAX_LEN: usize = 64;

// ============================================================================
// Request Types
// ============================================================================

/// Descriptor for one file a client wants to upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReq {
    /// Slash-separated relative path inside the vault
    pub rel_path: String,

    /// File size in bytes
    pub size: u64,

    /// MIME type the file will be stored under
    pub content_type: String,
}

/// Request to start an upload session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    /// Optional client-supplied session id; validated against an allow-list
    /// pattern. Server generates one when absent.
    #[serde(default)]
    pub session_id: Option<String>,

    /// Files to mint grants for; must be non-empty
    pub files: Vec<FileReq>,
}

// ============================================================================
// Session Types
// ============================================================================

/// A minted upload grant: one grant maps to exactly one file for the lifetime
/// of the session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadGrant {
    /// Relative path the grant was minted for
    pub rel_path: String,

    /// Deterministic object key: `<namespace>/<sessionId>/<sanitizedPath>`
    pub object_key: String,

    /// Canonical storage URI for the object
    pub storage_uri: String,

    /// Time-bounded signed URL to PUT the file's bytes to
    pub upload_url: String,

    /// Content type the signed URL was bound to
    pub content_type: String,

    /// Instant after which the grant is no longer honored
    pub expires_at: DateTime<Utc>,
}

/// An upload session plan
///
/// Not persisted server-side; the caller retains the plan and each grant's
/// expiry bounds its validity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSession {
    /// Opaque URL-safe session id
    pub session_id: String,

    /// One grant per file, in request order
    pub items: Vec<UploadGrant>,
}

impl UploadSession {
    /// Look up the grant for a relative path
    pub fn grant_for(&self, rel_path: &str) -> Option<&UploadGrant> {
        self.items.iter().find(|g| g.rel_path == rel_path)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Credential issuance failure from the storage backend
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("Storage backend refused to issue a grant for {key}: {reason}")]
    Refused { key: String, reason: String },
}

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("File list is empty; a session needs at least one file")]
    EmptyFileList,

    #[error("Invalid session id '{0}': expected 6-64 URL-safe characters")]
    InvalidSessionId(String),

    #[error("Invalid relative path '{0}': no usable segments after sanitization")]
    InvalidPath(String),

    #[error("Credential issuance failed: {0}")]
    CredentialIssuance(#[from] IssueError),
}

impl SessionError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::EmptyFileList => StatusCode::BAD_REQUEST,
            Self::InvalidSessionId(_) => StatusCode::BAD_REQUEST,
            Self::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Self::CredentialIssuance(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Validate a client-supplied session id: 6-64 chars, URL-safe alphabet
pub fn is_valid_session_id(id: &str) -> bool {
    (SESSION_ID_MIN_LEN..=SESSION_ID_MAX_LEN).contains(&id.len())
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
