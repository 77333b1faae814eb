//! # video-relay
//!
//! Backend for fronting a session-cookie-authenticated video generation
//! service.
//!
//! ## What it does
//!
//! - **Credential rotation** - Upstream calls rotate round-robin over a pool of
//!   pre-obtained session credentials
//! - **Record correlation** - A submitted job's identifier is matched against the
//!   loosely-typed upstream listing with prioritized rules
//! - **Bounded polling** - A wait settles on completed, failed or timeout
//! - **Artifact relay** - Produced videos are fetched server-side for callers
//!   that cannot reach the artifact host
//!
//! ## Quick Start
//!
//! ```no_run
//! use video_relay::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // DOUBAO_SESSION_COOKIE=cred1,cred2 AUTH_TOKEN=secret
//!     let config = Arc::new(Config::from_env()?);
//!
//!     // Serves until SIGTERM / Ctrl+C
//!     video_relay::api::start_api_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Polling without the HTTP layer
//!
//! ```no_run
//! use video_relay::{Config, CredentialPool, PollOutcome, PollSession, UpstreamClient};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> video_relay::Result<()> {
//! let config = Config::from_env()?;
//! let pool = Arc::new(CredentialPool::new(config.upstream.credentials.clone()));
//! let upstream = UpstreamClient::new(&config.upstream, pool)?;
//!
//! let mut session = PollSession::new("task_001", Duration::from_secs(5), Duration::from_secs(300))?;
//! if let PollOutcome::Completed { video_url, .. } = session.run(&upstream).await? {
//!     println!("done: {video_url:?}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Upstream session credential rotation
pub mod credentials;
/// Error types
pub mod error;
/// Listing record correlation
pub mod matcher;
/// Completion polling state machine
pub mod poll;
/// Server-side artifact relay
pub mod relay;
/// Core types and API envelopes
pub mod types;
/// Upstream HTTP client
pub mod upstream;

// Re-export commonly used types
pub use config::{ApiConfig, Config, PollConfig, RelayConfig, UpstreamConfig};
pub use credentials::{Credential, CredentialPool};
pub use error::{ApiError, AuthError, Error, ErrorDetail, RelayError, Result, ToHttpStatus};
pub use matcher::{MatchRule, RecordMatch, find_match};
pub use poll::{JobListing, PollOutcome, PollSession, PollState};
pub use relay::{ProxyTarget, RelayFetcher, RelayResponse};
pub use types::{JobRecord, JobStatus, RequestedIdentifier};
pub use upstream::UpstreamClient;

/// Wait for a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Wait for a termination signal (Ctrl+C).
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
