//! Token minting collaborator
//!
//! Minting is strictly optional: the manifest is already written and valid
//! before a mint is attempted, and a mint failure never invalidates it. The
//! minter is an external capability reached through a trait so builds can run
//! without one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::pricing::PlanConfig;

use super::types::Manifest;

/// Minting errors
#[derive(Debug, thiserror::Error)]
pub enum MintingError {
    #[error("Minting service rejected manifest {manifest_uri}: {reason}")]
    Rejected { manifest_uri: String, reason: String },

    #[error("Minting service unavailable: {0}")]
    Unavailable(String),
}

/// Result of a successful mint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    pub token_id: String,
    pub transaction_reference: String,
}

/// External token minting capability
///
/// Accepts a manifest reference (a storage URI) and a destination identity;
/// returns the minted token's identifiers or fails.
#[async_trait]
pub trait TokenMinter: Send + Sync {
    async fn mint(
        &self,
        manifest_uri: &str,
        destination: &str,
    ) -> Result<MintReceipt, MintingError>;
}

// ============================================================================
// Token Metadata
// ============================================================================

/// Token metadata document handed to the minting collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub attributes: Vec<TokenAttribute>,
}

/// One `{trait_type, value}` attribute pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenAttribute {
    pub trait_type: String,
    pub value: String,
}

/// Hex digits of the digest surfaced in token metadata
const DIGEST_PREFIX_LEN: usize = 12;

/// Build the token metadata document for an assembled manifest
pub fn token_metadata(manifest: &Manifest, symbol: &str, plan: &PlanConfig) -> TokenMetadata {
    let digest_prefix: String = manifest
        .archive
        .digest
        .chars()
        .take(DIGEST_PREFIX_LEN)
        .collect();

    let attr = |trait_type: &str, value: String| TokenAttribute {
        trait_type: trait_type.to_string(),
        value,
    };

    TokenMetadata {
        name: manifest.name.clone(),
        symbol: symbol.to_string(),
        description: format!(
            "Vault of {} files ({} bytes), digest {}…",
            manifest.archive.file_count, manifest.archive.total_bytes, digest_prefix
        ),
        attributes: vec![
            attr("Files", manifest.archive.file_count.to_string()),
            attr("Total Bytes", manifest.archive.total_bytes.to_string()),
            attr("Digest Prefix", digest_prefix),
            attr(
                "Billed GB",
                manifest.economic_preview.billed_gb.to_string(),
            ),
            attr("Plan", plan.name.clone()),
            attr("Heirs", manifest.heritage.heirs.len().to_string()),
            attr(
                "Unlock After (years)",
                manifest.heritage.unlock_after_years.to_string(),
            ),
        ],
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::types::{
        ArchiveDescriptor, Heir, HeritagePolicy, StoragePolicy, Visibility, DIGEST_ALGORITHM,
        MANIFEST_VERSION,
    };
    use chrono::Utc;
    use uuid::Uuid;

    fn manifest() -> Manifest {
        Manifest {
            manifest_version: MANIFEST_VERSION,
            archive_id: Uuid::new_v4(),
            revision: 1,
            created_at: Utc::now(),
            name: "family-archive".to_string(),
            visibility: Visibility::Private,
            archive: ArchiveDescriptor {
                file_count: 3,
                total_bytes: 1024,
                digest: "deadbeefcafe0123456789".to_string(),
                digest_algorithm: DIGEST_ALGORITHM.to_string(),
            },
            files: vec![],
            storage: StoragePolicy {
                provider: "minio".to_string(),
                bucket: "vault-objects".to_string(),
                namespace: "vaults".to_string(),
                session_id: "abcdef".to_string(),
            },
            heritage: HeritagePolicy {
                heirs: vec![Heir {
                    name: "Alex".to_string(),
                    contact: "alex@example.test".to_string(),
                    share_percent: 100.0,
                }],
                unlock_after_years: 25,
            },
            economic_preview: crate::pricing::quote(1024, &Default::default()).for_display(),
            endowment: None,
            token: None,
        }
    }

    #[test]
    fn test_token_metadata_describes_archive() {
        let meta = token_metadata(&manifest(), "VAULT", &PlanConfig::default());

        assert_eq!(meta.name, "family-archive");
        assert_eq!(meta.symbol, "VAULT");

        let get = |t: &str| {
            meta.attributes
                .iter()
                .find(|a| a.trait_type == t)
                .map(|a| a.value.as_str())
        };
        assert_eq!(get("Files"), Some("3"));
        assert_eq!(get("Total Bytes"), Some("1024"));
        assert_eq!(get("Digest Prefix"), Some("deadbeefcafe"));
        assert_eq!(get("Plan"), Some("standard"));
        assert_eq!(get("Heirs"), Some("1"));
        assert_eq!(get("Unlock After (years)"), Some("25"));
    }

    #[test]
    fn test_token_metadata_serializes_snake_case_attributes() {
        let json =
            serde_json::to_string(&token_metadata(&manifest(), "VAULT", &PlanConfig::default()))
                .unwrap();
        assert!(json.contains("\"trait_type\""));
        assert!(json.contains("\"value\""));
    }
}
