//! Manifest types
//!
//! A manifest is the terminal, immutable record of a vault build. Attaching a
//! token reference never edits a manifest in place; it produces a new revision
//! carrying the same archive id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::endowment::EndowmentLock;
use crate::pricing::PricingQuote;

/// Current manifest document version
pub const MANIFEST_VERSION: u32 = 1;

/// Digest algorithm recorded alongside archive digests
pub const DIGEST_ALGORITHM: &str = "sha256";

// ============================================================================
// Component Types
// ============================================================================

/// Vault visibility classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Unlisted,
    Public,
}

/// One named heir in a heritage policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heir {
    pub name: String,
    pub contact: String,
    pub share_percent: f64,
}

/// Succession terms for a vault
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeritagePolicy {
    pub heirs: Vec<Heir>,
    pub unlock_after_years: u32,
}

/// One file recorded in a manifest
///
/// `object_key` is absent when the build skipped the file (no grant matched).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub relative_path: String,
    pub size_bytes: u64,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
}

/// Whole-archive descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveDescriptor {
    pub file_count: usize,
    pub total_bytes: u64,
    pub digest: String,
    pub digest_algorithm: String,
}

/// Where the vault's objects live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePolicy {
    pub provider: String,
    pub bucket: String,
    pub namespace: String,
    pub session_id: String,
}

/// Reference to a minted token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRef {
    pub token_id: String,
    pub transaction_reference: String,
    pub minted_at: DateTime<Utc>,
}

// ============================================================================
// Manifest
// ============================================================================

/// The immutable record describing a vault's contents, storage location,
/// policy, and optional token linkage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub manifest_version: u32,

    /// Globally unique archive id, stable across revisions
    pub archive_id: Uuid,

    /// Revision counter; starts at 1, bumped when a token is attached
    pub revision: u32,

    pub created_at: DateTime<Utc>,

    pub name: String,
    pub visibility: Visibility,

    pub archive: ArchiveDescriptor,
    pub files: Vec<FileEntry>,
    pub storage: StoragePolicy,
    pub heritage: HeritagePolicy,

    /// Pricing preview frozen at commit, display-rounded
    pub economic_preview: PricingQuote,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endowment: Option<EndowmentLock>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenRef>,
}

impl Manifest {
    /// New revision of this manifest with a token reference attached.
    ///
    /// The original is left untouched; the revision shares the archive id and
    /// carries its own creation timestamp.
    pub fn with_token(&self, token: TokenRef) -> Manifest {
        let mut next = self.clone();
        next.revision += 1;
        next.created_at = Utc::now();
        next.token = Some(token);
        next
    }

    /// Serialize as a self-contained pretty JSON document
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
