//! Storage types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about a storage object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
}

/// A signed PUT credential minted for one object key
#[derive(Debug, Clone)]
pub struct PresignedPut {
    /// Time-bounded signed URL a client may PUT bytes to
    pub url: String,

    /// Instant after which the URL is no longer honored
    pub expires_at: DateTime<Utc>,
}
