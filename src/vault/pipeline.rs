//! Build pipeline
//!
//! One vault build walks a forward-only state machine; there is no automatic
//! rollback. A user-initiated reset discards the in-memory record and returns
//! to plan selection. The [`VaultBuilder`] drives the stages end to end:
//! collect, hash and start the upload session in parallel, transfer, price,
//! assemble, export, and optionally mint.

use std::path::Path;
use std::sync::Arc;

use crate::endowment::RateSource;
use crate::manifest::{
    assemble, AssembleInput, ExportError, ExportReceipt, HeritagePolicy, Manifest,
    ManifestExporter, MintReceipt, StoragePolicy, TokenMinter, ValidationError, Visibility,
};
use crate::pricing::{quote, PlanConfig};
use crate::session::{SessionError, SessionManager};
use crate::transfer::{TransferError, UploadExecutor, UploadReport};

use super::collect::{collect_dir, total_bytes, CollectError};
use super::hash::{archive_digest, HashError};

// ============================================================================
// Build Stages
// ============================================================================

/// Stages of a single vault build, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildStage {
    SelectPlan,
    Upload,
    Pricing,
    Manifest,
    Minting,
    Vault,
}

/// Stage machine errors
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("Cannot move from {from:?} to {to:?}: transitions are forward-only")]
    InvalidTransition { from: BuildStage, to: BuildStage },
}

/// In-memory record of one build's position in the stage machine
///
/// Single writer; transitions only ever move forward. Minting may be skipped
/// (Manifest straight to Vault) since a token is never required.
#[derive(Debug)]
pub struct BuildSession {
    stage: BuildStage,
}

impl BuildSession {
    pub fn new() -> Self {
        Self {
            stage: BuildStage::SelectPlan,
        }
    }

    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    /// Move to a later stage; same-or-earlier targets are rejected
    pub fn advance(&mut self, to: BuildStage) -> Result<(), StageError> {
        if to <= self.stage {
            return Err(StageError::InvalidTransition {
                from: self.stage,
                to,
            });
        }
        tracing::debug!(from = ?self.stage, to = ?to, "Build stage advanced");
        self.stage = to;
        Ok(())
    }

    /// Discard all progress and return to plan selection
    pub fn reset(&mut self) {
        tracing::debug!(from = ?self.stage, "Build reset");
        self.stage = BuildStage::SelectPlan;
    }
}

impl Default for BuildSession {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Build errors, tagged by the stage that raised them
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Collect failed: {0}")]
    Collect(#[from] CollectError),

    #[error("Hashing failed: {0}")]
    Hash(#[from] HashError),

    #[error("Session failed: {0}")]
    Session(#[from] SessionError),

    #[error("Upload failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Manifest validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Manifest export failed: {0}")]
    Export(#[from] ExportError),
}

/// User-confirmed parameters for one build
pub struct BuildRequest {
    pub name: Option<String>,
    pub visibility: Option<Visibility>,
    pub pricing_accepted: bool,
    pub heritage: HeritagePolicy,
    pub endowment_usd: Option<f64>,

    /// Identity to mint the vault's token to, when a minter is configured
    pub mint_destination: Option<String>,
}

/// Everything a finished build produced
#[derive(Debug)]
pub struct BuildOutcome {
    pub manifest: Manifest,
    pub export: ExportReceipt,
    pub report: UploadReport,
    pub token: Option<MintReceipt>,
}

/// Drives a full vault build through its stages
pub struct VaultBuilder {
    sessions: SessionManager,
    executor: UploadExecutor,
    exporter: Arc<dyn ManifestExporter>,
    minter: Option<Arc<dyn TokenMinter>>,
    rates: Arc<dyn RateSource>,
    plan: PlanConfig,
    storage_provider: String,
    storage_bucket: String,
    namespace: String,
}

impl VaultBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: SessionManager,
        executor: UploadExecutor,
        exporter: Arc<dyn ManifestExporter>,
        rates: Arc<dyn RateSource>,
        plan: PlanConfig,
        storage_provider: String,
        storage_bucket: String,
        namespace: String,
    ) -> Self {
        Self {
            sessions,
            executor,
            exporter,
            minter: None,
            rates,
            plan,
            storage_provider,
            storage_bucket,
            namespace,
        }
    }

    /// Attach an optional token minting collaborator
    pub fn with_minter(mut self, minter: Arc<dyn TokenMinter>) -> Self {
        self.minter = Some(minter);
        self
    }

    /// Build a vault from every file under `root`.
    ///
    /// Hashing and session setup run in parallel; a transfer failure aborts
    /// before any manifest is written. A mint failure is tolerated: the
    /// outcome carries the already-exported manifest with no token attached.
    pub async fn build_dir(
        &self,
        root: &Path,
        request: BuildRequest,
    ) -> Result<BuildOutcome, BuildError> {
        let mut stage = BuildSession::new();

        let files = collect_dir(root).await?;
        let reqs: Vec<_> = files.iter().map(|f| f.to_file_req()).collect();

        // Hashing and grant issuance are independent I/O; overlap them.
        let (digest, session) = tokio::join!(
            archive_digest(&files),
            self.sessions.start_session(None, &reqs)
        );
        let digest = digest?;
        let session = session?;

        // advance() cannot fail on this fixed forward walk
        let _ = stage.advance(BuildStage::Upload);
        let report = self.executor.execute(&session, &files).await?;

        let _ = stage.advance(BuildStage::Pricing);
        let pricing = quote(total_bytes(&files), &self.plan);

        let _ = stage.advance(BuildStage::Manifest);
        let manifest = assemble(
            AssembleInput {
                name: request.name,
                visibility: request.visibility,
                pricing_accepted: request.pricing_accepted,
                files: &files,
                digest,
                quote: &pricing,
                session: &session,
                storage: StoragePolicy {
                    provider: self.storage_provider.clone(),
                    bucket: self.storage_bucket.clone(),
                    namespace: self.namespace.clone(),
                    session_id: session.session_id.clone(),
                },
                heritage: request.heritage,
                endowment_usd: request.endowment_usd,
            },
            self.rates.as_ref(),
        )?;
        let export = self.exporter.export(&manifest).await?;

        let (manifest, export, token) = match (&self.minter, &request.mint_destination) {
            (Some(minter), Some(destination)) => {
                let _ = stage.advance(BuildStage::Minting);
                self.try_mint(minter.as_ref(), manifest, export, destination)
                    .await?
            }
            _ => (manifest, export, None),
        };

        let _ = stage.advance(BuildStage::Vault);
        tracing::info!(
            archive_id = %manifest.archive_id,
            session_id = %report.session_id,
            files = manifest.archive.file_count,
            minted = token.is_some(),
            "Vault build complete"
        );

        Ok(BuildOutcome {
            manifest,
            export,
            report,
            token,
        })
    }

    /// Mint against the exported manifest; a failure leaves the manifest as
    /// written and the build token-less.
    async fn try_mint(
        &self,
        minter: &dyn TokenMinter,
        manifest: Manifest,
        export: ExportReceipt,
        destination: &str,
    ) -> Result<(Manifest, ExportReceipt, Option<MintReceipt>), BuildError> {
        match minter.mint(&export.location, destination).await {
            Ok(receipt) => {
                let revised = manifest.with_token(crate::manifest::TokenRef {
                    token_id: receipt.token_id.clone(),
                    transaction_reference: receipt.transaction_reference.clone(),
                    minted_at: chrono::Utc::now(),
                });
                let export = self.exporter.export(&revised).await?;
                Ok((revised, export, Some(receipt)))
            }
            Err(e) => {
                tracing::warn!(
                    archive_id = %manifest.archive_id,
                    error = %e,
                    "Minting failed; manifest remains valid without a token"
                );
                Ok((manifest, export, None))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_advance_forward() {
        let mut session = BuildSession::new();
        assert_eq!(session.stage(), BuildStage::SelectPlan);

        session.advance(BuildStage::Upload).unwrap();
        session.advance(BuildStage::Pricing).unwrap();
        session.advance(BuildStage::Manifest).unwrap();
        session.advance(BuildStage::Minting).unwrap();
        session.advance(BuildStage::Vault).unwrap();
        assert_eq!(session.stage(), BuildStage::Vault);
    }

    #[test]
    fn test_minting_may_be_skipped() {
        let mut session = BuildSession::new();
        session.advance(BuildStage::Manifest).unwrap();
        session.advance(BuildStage::Vault).unwrap();
        assert_eq!(session.stage(), BuildStage::Vault);
    }

    #[test]
    fn test_backward_transition_is_rejected() {
        let mut session = BuildSession::new();
        session.advance(BuildStage::Pricing).unwrap();

        let err = session.advance(BuildStage::Upload).unwrap_err();
        assert!(matches!(err, StageError::InvalidTransition { .. }));
        assert_eq!(session.stage(), BuildStage::Pricing);
    }

    #[test]
    fn test_same_stage_is_rejected() {
        let mut session = BuildSession::new();
        session.advance(BuildStage::Upload).unwrap();
        assert!(session.advance(BuildStage::Upload).is_err());
    }

    #[test]
    fn test_reset_returns_to_select_plan() {
        let mut session = BuildSession::new();
        session.advance(BuildStage::Manifest).unwrap();

        session.reset();
        assert_eq!(session.stage(), BuildStage::SelectPlan);
        // A fresh forward walk works again after reset
        session.advance(BuildStage::Upload).unwrap();
    }
}
