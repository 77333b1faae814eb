//! Application state for the API server

use crate::credentials::CredentialPool;
use crate::relay::RelayFetcher;
use crate::upstream::UpstreamClient;
use crate::{Config, Result};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clones). The credential pool lives inside
/// the upstream client and is shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Session-cookie client for the upstream service
    pub upstream: Arc<UpstreamClient>,

    /// Artifact relay
    pub relay: Arc<RelayFetcher>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the clients described by `config`
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let pool = Arc::new(CredentialPool::new(config.upstream.credentials.iter().cloned()));
        let upstream = UpstreamClient::new(&config.upstream, pool)?;
        let relay = RelayFetcher::new(&config.relay)?;

        tracing::info!(
            base_url = %config.upstream.base_url,
            credentials = config.upstream.credentials.len(),
            auth_enabled = config.server.api.auth_enabled(),
            "Application state ready"
        );

        Ok(Self {
            upstream: Arc::new(upstream),
            relay: Arc::new(relay),
            config,
        })
    }
}
