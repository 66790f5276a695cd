//! Application state management

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::session::{S3CredentialIssuer, SessionManager};
use crate::storage::S3Client;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pub config: Config,
    pub s3_client: S3Client,
    pub sessions: SessionManager,
}

impl AppState {
    /// Create a new application state
    ///
    /// The session manager issues grants through the S3 client; both share
    /// the same bucket and namespace from configuration.
    pub fn new(config: Config, s3_client: S3Client) -> Self {
        let issuer = Arc::new(S3CredentialIssuer::new(s3_client.clone()));
        let sessions = SessionManager::new(
            issuer,
            config.grants.namespace.clone(),
            Duration::from_secs(config.grants.ttl_secs),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                s3_client,
                sessions,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the S3 client
    pub fn s3_client(&self) -> &S3Client {
        &self.inner.s3_client
    }

    /// Get the session manager
    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }
}
