//! Configuration types for video-relay

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, SocketAddr},
    time::Duration,
};
use utoipa::ToSchema;

/// Main configuration
///
/// Fields are organized into logical sub-configs:
/// - [`upstream`](UpstreamConfig) - upstream base URL, session credentials, call timeouts
/// - [`polling`](PollConfig) - default poll interval and wait budget
/// - [`relay`](RelayConfig) - relay timeout and cache directive
/// - [`server`](ServerIntegrationConfig) - REST API binding, auth tokens, CORS
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Upstream service settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Completion polling defaults
    #[serde(default)]
    pub polling: PollConfig,

    /// Artifact relay settings
    #[serde(default)]
    pub relay: RelayConfig,

    /// API and external server integration
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,
}

/// Upstream service configuration
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct UpstreamConfig {
    /// Upstream base URL (default: "https://doubao.happieapi.top")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Pre-obtained session credentials, rotated round-robin
    #[serde(default)]
    pub credentials: Vec<String>,

    /// Model used when a create request does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Timeout for listing and statistics calls (default: 30 seconds)
    #[serde(default = "default_list_timeout", with = "duration_serde")]
    pub list_timeout: Duration,

    /// Timeout for job submission (default: 120 seconds)
    #[serde(default = "default_submit_timeout", with = "duration_serde")]
    pub submit_timeout: Duration,

    /// Timeout for image upload (default: 60 seconds)
    #[serde(default = "default_upload_timeout", with = "duration_serde")]
    pub upload_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            credentials: Vec::new(),
            default_model: default_model(),
            list_timeout: default_list_timeout(),
            submit_timeout: default_submit_timeout(),
            upload_timeout: default_upload_timeout(),
        }
    }
}

// Credentials stay out of Debug output
impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("credentials", &format_args!("[{} redacted]", self.credentials.len()))
            .field("default_model", &self.default_model)
            .field("list_timeout", &self.list_timeout)
            .field("submit_timeout", &self.submit_timeout)
            .field("upload_timeout", &self.upload_timeout)
            .finish()
    }
}

/// Completion polling defaults
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PollConfig {
    /// Time between listing fetches (default: 5 seconds)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,

    /// Maximum time to wait for a terminal status (default: 300 seconds)
    #[serde(default = "default_max_wait", with = "duration_serde")]
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            max_wait: default_max_wait(),
        }
    }
}

/// Artifact relay configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RelayConfig {
    /// Network timeout for a relay fetch (default: 300 seconds)
    #[serde(default = "default_relay_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// `max-age` of the public cache directive on relayed bodies (default: 3600 seconds)
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            timeout: default_relay_timeout(),
            cache_max_age: default_cache_max_age(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Accepted bearer tokens. Empty disables authorization entirely.
    #[serde(default)]
    pub auth_tokens: Vec<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Maximum request body accepted by the image upload routes (default: 50 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            auth_tokens: Vec::new(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_address", &self.bind_address)
            .field("auth_tokens", &format_args!("[{} redacted]", self.auth_tokens.len()))
            .field("cors_enabled", &self.cors_enabled)
            .field("cors_origins", &self.cors_origins)
            .field("swagger_ui", &self.swagger_ui)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl ApiConfig {
    /// Whether bearer-token authorization is enforced
    pub fn auth_enabled(&self) -> bool {
        !self.auth_tokens.is_empty()
    }
}

impl Config {
    /// Build a configuration from process environment variables.
    ///
    /// See [`Config::from_lookup`] for the recognized variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Recognized keys:
    /// - `DOUBAO_BASE_URL` - upstream base URL
    /// - `DOUBAO_SESSION_COOKIE` - comma-separated session credentials, each percent-decoded
    /// - `AUTH_TOKEN` - comma-separated bearer tokens
    /// - `API_HOST` / `API_PORT` - bind address parts
    /// - `MAX_UPLOAD_BYTES` - body limit of the image upload routes
    ///
    /// Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(base_url) = lookup("DOUBAO_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.upstream.base_url = base_url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup("DOUBAO_SESSION_COOKIE") {
            config.upstream.credentials = split_list(&raw)
                .into_iter()
                .map(|c| {
                    urlencoding::decode(&c)
                        .map(|decoded| decoded.into_owned())
                        .map_err(|e| Error::Config {
                            message: format!("session credential is not valid UTF-8: {e}"),
                            key: Some("DOUBAO_SESSION_COOKIE".to_string()),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
        }

        if let Some(raw) = lookup("AUTH_TOKEN") {
            config.server.api.auth_tokens = split_list(&raw);
        }

        let host = match lookup("API_HOST") {
            Some(host) => host.trim().parse::<IpAddr>().map_err(|e| Error::Config {
                message: format!("invalid host {host:?}: {e}"),
                key: Some("API_HOST".to_string()),
            })?,
            None => config.server.api.bind_address.ip(),
        };
        let port = match lookup("API_PORT") {
            Some(port) => port.trim().parse::<u16>().map_err(|e| Error::Config {
                message: format!("invalid port {port:?}: {e}"),
                key: Some("API_PORT".to_string()),
            })?,
            None => config.server.api.bind_address.port(),
        };
        config.server.api.bind_address = SocketAddr::new(host, port);

        if let Some(raw) = lookup("MAX_UPLOAD_BYTES") {
            config.server.api.max_upload_bytes =
                raw.trim().parse::<usize>().map_err(|e| Error::Config {
                    message: format!("invalid upload limit {raw:?}: {e}"),
                    key: Some("MAX_UPLOAD_BYTES".to_string()),
                })?;
        }

        Ok(config)
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_base_url() -> String {
    "https://doubao.happieapi.top".to_string()
}

fn default_model() -> String {
    "seedance-1-5-pro-251215".to_string()
}

fn default_list_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_submit_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_upload_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_max_wait() -> Duration {
    Duration::from_secs(300)
}

fn default_relay_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_cache_max_age() -> u64 {
    3600
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
