//! Upload Executor
//!
//! Consumes a session plan and PUTs each file's bytes directly to its granted
//! URL. Plan items are matched to local files by relative path; items with no
//! local counterpart are skipped, not errors, so a partially changed local
//! tree never fails the batch by itself.
//!
//! Transfers run with bounded concurrency. The first non-2xx response aborts
//! the batch: in-flight siblings are dropped, not-yet-started items stay
//! unattempted, and the failure carries destination, status, and response
//! body so a credential problem (403/expired) can be told apart from a
//! network or server failure. Nothing is retried silently.

pub mod progress;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use serde::Serialize;
use tokio_util::io::ReaderStream;

use crate::session::types::{UploadGrant, UploadSession};
use crate::vault::collect::LogicalFile;

use progress::CountingStream;
pub use progress::{ProgressSnapshot, TransferProgress};

// ============================================================================
// Constants
// ============================================================================

/// Default bound on concurrent transfers
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Read size for streaming request bodies
const BODY_CHUNK_SIZE: usize = 64 * 1024;

/// Captured response bodies are truncated to this many bytes
const FAILURE_BODY_LIMIT: usize = 2048;

// ============================================================================
// Result Types
// ============================================================================

/// Per-file transfer outcome
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum FileOutcome {
    /// Bytes landed at the granted destination
    Completed { bytes: u64 },

    /// The destination rejected the transfer or the transport failed.
    /// `status` is absent for transport-level failures.
    Failed {
        destination: String,
        status: Option<u16>,
        body: String,
    },

    /// Plan item had no matching local file
    SkippedNoLocalFile,

    /// Batch aborted before this item started
    Unattempted,
}

/// One plan item's result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    pub rel_path: String,
    pub outcome: FileOutcome,
}

/// Full batch report, in plan order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub session_id: String,
    pub files: Vec<FileResult>,
    pub bytes_sent: u64,
}

impl UploadReport {
    pub fn completed_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Completed { .. }))
            .count()
    }

    pub fn is_fully_complete(&self) -> bool {
        self.files
            .iter()
            .all(|f| matches!(f.outcome, FileOutcome::Completed { .. } | FileOutcome::SkippedNoLocalFile))
    }
}

/// Transfer errors
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// A specific transfer was rejected; the batch aborted. The report
    /// preserves partial progress for inspection.
    #[error("Upload of '{rel_path}' to {destination} failed (status {status:?}): {body}")]
    UploadFailed {
        rel_path: String,
        destination: String,
        status: Option<u16>,
        body: String,
        report: UploadReport,
    },
}

// ============================================================================
// Executor
// ============================================================================

/// Executes the upload plan of a session
#[derive(Clone)]
pub struct UploadExecutor {
    http: reqwest::Client,
    max_in_flight: usize,
}

impl UploadExecutor {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Cap the number of concurrent transfers (minimum 1)
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Upload every matched file in the session plan.
    ///
    /// Returns the full report on success; on failure returns `UploadFailed`
    /// naming the item that broke the batch, with the partial report inside.
    pub async fn execute(
        &self,
        session: &UploadSession,
        local: &[LogicalFile],
    ) -> Result<UploadReport, TransferError> {
        let total: u64 = local.iter().map(|f| f.size_bytes).sum();
        let progress = TransferProgress::new(total, session.items.len());
        self.execute_with_progress(session, local, &progress).await
    }

    /// Like `execute`, reporting into an externally observable progress handle
    pub async fn execute_with_progress(
        &self,
        session: &UploadSession,
        local: &[LogicalFile],
        progress: &TransferProgress,
    ) -> Result<UploadReport, TransferError> {
        let by_path: HashMap<&str, &LogicalFile> = local
            .iter()
            .map(|f| (f.relative_path.as_str(), f))
            .collect();

        // Match plan items to local files; record skips up front.
        let mut outcomes: Vec<Option<FileOutcome>> = vec![None; session.items.len()];
        let mut jobs: Vec<(usize, &UploadGrant, &LogicalFile)> = Vec::new();

        for (index, grant) in session.items.iter().enumerate() {
            match by_path.get(grant.rel_path.as_str()) {
                Some(&file) => jobs.push((index, grant, file)),
                None => {
                    tracing::warn!(
                        rel_path = %grant.rel_path,
                        "Plan item has no local file, skipping"
                    );
                    outcomes[index] = Some(FileOutcome::SkippedNoLocalFile);
                }
            }
        }

        // Out-of-order completions are credited through this map even when
        // the batch aborts before their result is drained.
        let completed: Arc<Mutex<HashMap<usize, u64>>> = Arc::new(Mutex::new(HashMap::new()));

        let transfers = jobs.into_iter().map(|(index, grant, file)| {
            let http = self.http.clone();
            let progress = progress.clone();
            let completed = Arc::clone(&completed);
            async move {
                match put_file(&http, grant, file, &progress).await {
                    Ok(bytes) => {
                        completed
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .insert(index, bytes);
                        progress.item_done();
                        tracing::debug!(
                            rel_path = %grant.rel_path,
                            bytes = bytes,
                            "Transfer complete"
                        );
                        Ok(())
                    }
                    Err(failure) => Err((index, failure)),
                }
            }
        });

        let mut stream = futures::stream::iter(transfers).buffered(self.max_in_flight);

        let mut failed: Option<(usize, PutFailure)> = None;
        while let Some(result) = stream.next().await {
            if let Err(failure) = result {
                failed = Some(failure);
                break;
            }
        }
        // Dropping the stream cancels any transfers still in flight.
        drop(stream);

        let completed = completed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for (index, bytes) in completed.iter() {
            outcomes[*index] = Some(FileOutcome::Completed { bytes: *bytes });
        }

        if let Some((index, failure)) = &failed {
            outcomes[*index] = Some(FileOutcome::Failed {
                destination: failure.destination.clone(),
                status: failure.status,
                body: failure.body.clone(),
            });
        }

        let files: Vec<FileResult> = session
            .items
            .iter()
            .zip(outcomes)
            .map(|(grant, outcome)| FileResult {
                rel_path: grant.rel_path.clone(),
                outcome: outcome.unwrap_or(FileOutcome::Unattempted),
            })
            .collect();

        let report = UploadReport {
            session_id: session.session_id.clone(),
            files,
            bytes_sent: progress.snapshot().bytes_sent,
        };

        match failed {
            Some((index, failure)) => {
                let rel_path = session.items[index].rel_path.clone();
                tracing::error!(
                    rel_path = %rel_path,
                    destination = %failure.destination,
                    status = ?failure.status,
                    "Transfer batch aborted"
                );
                Err(TransferError::UploadFailed {
                    rel_path,
                    destination: failure.destination,
                    status: failure.status,
                    body: failure.body,
                    report,
                })
            }
            None => Ok(report),
        }
    }
}

impl Default for UploadExecutor {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Single Transfer
// ============================================================================

struct PutFailure {
    destination: String,
    status: Option<u16>,
    body: String,
}

/// PUT one file's bytes to its granted URL, streaming in bounded chunks
async fn put_file(
    http: &reqwest::Client,
    grant: &UploadGrant,
    file: &LogicalFile,
    progress: &TransferProgress,
) -> Result<u64, PutFailure> {
    let handle = tokio::fs::File::open(&file.source)
        .await
        .map_err(|e| PutFailure {
            destination: grant.upload_url.clone(),
            status: None,
            body: format!("failed to open local file {}: {}", file.source.display(), e),
        })?;

    let stream = CountingStream::new(
        ReaderStream::with_capacity(handle, BODY_CHUNK_SIZE),
        progress.clone(),
    );

    let response = http
        .put(&grant.upload_url)
        .header(reqwest::header::CONTENT_TYPE, &grant.content_type)
        .header(reqwest::header::CONTENT_LENGTH, file.size_bytes.to_string())
        .body(reqwest::Body::wrap_stream(stream))
        .send()
        .await
        .map_err(|e| PutFailure {
            destination: grant.upload_url.clone(),
            status: None,
            body: format!("transport error: {}", e),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PutFailure {
            destination: grant.upload_url.clone(),
            status: Some(status.as_u16()),
            body: truncate_body(body),
        });
    }

    Ok(file.size_bytes)
}

fn truncate_body(mut body: String) -> String {
    if body.len() > FAILURE_BODY_LIMIT {
        let mut end = FAILURE_BODY_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}

// ============================================================================
// Tests
// ============================================================================
