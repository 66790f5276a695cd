//! Manifest assembly
//!
//! Collapses the outputs of a build (collected files, archive digest, upload
//! plan, accepted pricing, heritage terms, optional endowment input) into one
//! immutable manifest. Required fields are checked before any side effect; the
//! endowment rate is read exactly once, here, at commit time.

use chrono::Utc;
use uuid::Uuid;

use crate::endowment::{EndowmentError, EndowmentLock, RateSource};
use crate::pricing::PricingQuote;
use crate::session::UploadSession;
use crate::vault::collect::{total_bytes, LogicalFile};

use super::types::{
    ArchiveDescriptor, FileEntry, HeritagePolicy, Manifest, StoragePolicy, Visibility,
    DIGEST_ALGORITHM, MANIFEST_VERSION,
};

/// Manifest validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error(transparent)]
    Endowment(#[from] EndowmentError),
}

/// Everything a manifest is assembled from
///
/// `name`, `visibility`, and `pricing_accepted` are the user-confirmed fields;
/// assembly refuses to proceed while any of them is missing.
pub struct AssembleInput<'a> {
    pub name: Option<String>,
    pub visibility: Option<Visibility>,
    pub pricing_accepted: bool,

    pub files: &'a [LogicalFile],
    pub digest: String,
    pub quote: &'a PricingQuote,
    pub session: &'a UploadSession,
    pub storage: StoragePolicy,
    pub heritage: HeritagePolicy,

    /// USD endowment to lock at commit time, if any
    pub endowment_usd: Option<f64>,
}

/// Assemble the immutable manifest for a completed build.
///
/// Fails with [`ValidationError`] before producing anything when required
/// fields are missing or the endowment input is unusable. The live quote's
/// raw components stay with the caller; the manifest freezes a
/// display-rounded copy.
pub fn assemble(
    input: AssembleInput<'_>,
    rates: &dyn RateSource,
) -> Result<Manifest, ValidationError> {
    let mut missing = Vec::new();
    if input.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        missing.push("name");
    }
    if input.visibility.is_none() {
        missing.push("visibility");
    }
    if !input.pricing_accepted {
        missing.push("pricingAccepted");
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let endowment = match input.endowment_usd {
        Some(usd) => Some(EndowmentLock::lock(usd, rates)?),
        None => None,
    };

    let files: Vec<FileEntry> = input
        .files
        .iter()
        .map(|f| FileEntry {
            relative_path: f.relative_path.clone(),
            size_bytes: f.size_bytes,
            content_type: f.content_type.clone(),
            object_key: input
                .session
                .grant_for(&f.relative_path)
                .map(|g| g.object_key.clone()),
        })
        .collect();

    let manifest = Manifest {
        manifest_version: MANIFEST_VERSION,
        archive_id: Uuid::new_v4(),
        revision: 1,
        created_at: Utc::now(),
        // Checked non-empty above
        name: input.name.unwrap_or_default(),
        visibility: input.visibility.unwrap_or(Visibility::Private),
        archive: ArchiveDescriptor {
            file_count: files.len(),
            total_bytes: total_bytes(input.files),
            digest: input.digest,
            digest_algorithm: DIGEST_ALGORITHM.to_string(),
        },
        files,
        storage: input.storage,
        heritage: input.heritage,
        economic_preview: input.quote.for_display(),
        endowment,
        token: None,
    };

    tracing::info!(
        archive_id = %manifest.archive_id,
        name = %manifest.name,
        file_count = manifest.archive.file_count,
        total_bytes = manifest.archive.total_bytes,
        endowed = manifest.endowment.is_some(),
        "Assembled manifest"
    );

    Ok(manifest)
}

// ============================================================================
// Tests
// ============================================================================
