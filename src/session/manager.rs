//! Session manager
//!
//! Mints a full session plan in one shot. Grant issuance is parallel per file;
//! a single issuance failure aborts the whole session, cancelling in-flight
//! sibling requests and discarding already-issued grants so no partial plan
//! with orphaned keys ever reaches a caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::storage::S3Client;

use super::keys::derive_object_key;
use super::types::{
    is_valid_session_id, FileReq, IssueError, SessionError, UploadGrant, UploadSession,
};

// ============================================================================
// Credential Issuer
// ============================================================================

/// A credential minted by the storage backend for one object key
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub upload_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Storage credential issuer collaborator
///
/// Accepts a key and content type, returns a signed URL and expiry. Failures
/// abort the whole session.
#[async_trait::async_trait]
pub trait CredentialIssuer: Send + Sync {
    /// Mint a time-bounded PUT credential for an object key
    async fn issue_put_grant(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<IssuedCredential, IssueError>;

    /// Canonical storage URI for a key
    fn storage_uri(&self, key: &str) -> String;
}

/// Credential issuer backed by S3 presigned PUT URLs
#[derive(Clone)]
pub struct S3CredentialIssuer {
    client: S3Client,
}

impl S3CredentialIssuer {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl CredentialIssuer for S3CredentialIssuer {
    async fn issue_put_grant(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<IssuedCredential, IssueError> {
        let presigned = self
            .client
            .presign_put(key, content_type, ttl)
            .await
            .map_err(|e| IssueError::Refused {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        Ok(IssuedCredential {
            upload_url: presigned.url,
            expires_at: presigned.expires_at,
        })
    }

    fn storage_uri(&self, key: &str) -> String {
        self.client.storage_uri(key)
    }
}

// ============================================================================
// Session Manager
// ============================================================================

/// Mints upload session plans
///
/// Stateless across calls beyond what it returns: the caller retains the plan
/// and each grant's expiry is the sole validity boundary.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

struct SessionManagerInner {
    issuer: Arc<dyn CredentialIssuer>,
    namespace: String,
    grant_ttl: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(issuer: Arc<dyn CredentialIssuer>, namespace: String, grant_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(SessionManagerInner {
                issuer,
                namespace,
                grant_ttl,
            }),
        }
    }

    /// Start an upload session: derive a key and mint a grant for every file.
    ///
    /// Fails with `EmptyFileList` before any side effect when `files` is
    /// empty. Issuance runs in parallel; the first failure cancels the
    /// remaining requests and the whole session is discarded.
    pub async fn start_session(
        &self,
        session_id_hint: Option<&str>,
        files: &[FileReq],
    ) -> Result<UploadSession, SessionError> {
        if files.is_empty() {
            return Err(SessionError::EmptyFileList);
        }

        let session_id = match session_id_hint {
            Some(hint) => {
                if !is_valid_session_id(hint) {
                    return Err(SessionError::InvalidSessionId(hint.to_string()));
                }
                hint.to_string()
            }
            None => Uuid::new_v4().to_string(),
        };

        // Derive every key up front so a bad path fails the session before
        // any grant is requested.
        let mut planned = Vec::with_capacity(files.len());
        for file in files {
            let key = derive_object_key(&self.inner.namespace, &session_id, &file.rel_path)?;
            planned.push((file, key));
        }

        let grant_futures = planned.iter().map(|(file, key)| {
            let issuer = Arc::clone(&self.inner.issuer);
            let ttl = self.inner.grant_ttl;
            async move {
                let credential = issuer.issue_put_grant(key, &file.content_type, ttl).await?;
                Ok::<UploadGrant, IssueError>(UploadGrant {
                    rel_path: file.rel_path.clone(),
                    object_key: key.clone(),
                    storage_uri: issuer.storage_uri(key),
                    upload_url: credential.upload_url,
                    content_type: file.content_type.clone(),
                    expires_at: credential.expires_at,
                })
            }
        });

        // try_join_all drops sibling futures on the first error, which
        // cancels their in-flight requests; issued grants go down with the
        // aborted session.
        let items = futures::future::try_join_all(grant_futures).await?;

        tracing::info!(
            session_id = %session_id,
            files = items.len(),
            ttl_secs = self.inner.grant_ttl.as_secs(),
            "Started upload session"
        );

        Ok(UploadSession { session_id, items })
    }

    /// The namespace session keys are derived under
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }
}

// ============================================================================
// Tests
// ============================================================================
