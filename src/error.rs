//! Error types for video-relay
//!
//! This module provides the error taxonomy for the crate, including:
//! - Domain-specific error types (Auth, Relay)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//! - The split between failures rendered as errors and upstream failures that
//!   are reported inside a `success=false` envelope

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for video-relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for video-relay
///
/// Callers branch on the variant rather than on the message text.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "API_PORT")
        key: Option<String>,
    },

    /// The credential pool is empty, so no upstream call can be made
    #[error("no upstream session credentials configured")]
    NoCredentialsAvailable,

    /// Bearer-token authorization failed
    #[error("authorization failed: {0}")]
    Auth(#[from] AuthError),

    /// The upstream redirected to its login page
    #[error("upstream session expired or invalid, update the session credentials")]
    UpstreamSessionExpired {
        /// Final URL the upstream redirected to
        url: String,
    },

    /// The upstream answered with a non-success status
    #[error("upstream returned HTTP {status}")]
    UpstreamHttp {
        /// HTTP status code returned by the upstream
        status: u16,
        /// Raw response body for debugging
        body: String,
    },

    /// Relay failure
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),

    /// Request failed validation
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error talking to the upstream
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Bearer-token authorization errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No Authorization header on the request
    #[error("missing Authorization header, provide 'Authorization: Bearer <token>'")]
    MissingHeader,

    /// Authorization header uses a scheme other than Bearer
    #[error("invalid authorization scheme, expected 'Bearer <token>'")]
    InvalidScheme,

    /// Bearer scheme present but the token is empty
    #[error("missing token in Authorization header")]
    MissingToken,

    /// Token is not in the configured allow-list
    #[error("invalid or expired token")]
    InvalidToken,
}

/// Relay errors
#[derive(Debug, Error)]
pub enum RelayError {
    /// Target URL is malformed or uses an unsupported scheme
    #[error("invalid URL {url}: URL must start with http:// or https://")]
    InvalidUrl {
        /// The reconstructed URL that was rejected
        url: String,
    },

    /// Target answered with a non-200 status
    #[error("failed to fetch resource: {status}")]
    UpstreamStatus {
        /// HTTP status code returned by the target
        status: u16,
    },

    /// Target did not answer within the relay timeout
    #[error("proxy request timeout")]
    GatewayTimeout,

    /// Any other transport failure
    #[error("proxy request failed: {reason}")]
    BadGateway {
        /// Transport error description
        reason: String,
    },
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "invalid_url",
///     "message": "relay error: invalid URL ftp://x: URL must start with http:// or https://",
///     "details": {
///       "url": "ftp://x"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "unauthorized", "bad_gateway")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,
            Error::Relay(RelayError::InvalidUrl { .. }) => 400,

            // 401/403 - missing credentials are an unauthorized-class failure too
            Error::NoCredentialsAvailable => 401,
            Error::Auth(AuthError::InvalidToken) => 403,
            Error::Auth(_) => 401,

            // Upstream-reported failures are normally wrapped in an envelope;
            // rendered directly they surface as a gateway failure
            Error::UpstreamSessionExpired { .. } => 502,
            Error::UpstreamHttp { .. } => 502,

            // Relay passes the target's status through
            Error::Relay(RelayError::UpstreamStatus { status }) => *status,
            Error::Relay(RelayError::BadGateway { .. }) => 502,
            Error::Relay(RelayError::GatewayTimeout) => 504,

            // Network failures outside the relay are generic internal errors
            Error::Network(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::NoCredentialsAvailable => "no_credentials",
            Error::Auth(e) => match e {
                AuthError::MissingHeader => "missing_authorization",
                AuthError::InvalidScheme => "invalid_scheme",
                AuthError::MissingToken => "missing_token",
                AuthError::InvalidToken => "invalid_token",
            },
            Error::UpstreamSessionExpired { .. } => "session_expired",
            Error::UpstreamHttp { .. } => "upstream_error",
            Error::Relay(e) => match e {
                RelayError::InvalidUrl { .. } => "invalid_url",
                RelayError::UpstreamStatus { .. } => "upstream_status",
                RelayError::GatewayTimeout => "gateway_timeout",
                RelayError::BadGateway { .. } => "bad_gateway",
            },
            Error::Validation(_) => "validation_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "internal_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::UpstreamSessionExpired { url } => Some(serde_json::json!({
                "url": url,
            })),
            Error::UpstreamHttp { status, body } => Some(serde_json::json!({
                "status": status,
                "body": body,
            })),
            Error::Relay(RelayError::InvalidUrl { url }) => Some(serde_json::json!({
                "url": url,
            })),
            Error::Relay(RelayError::UpstreamStatus { status }) => Some(serde_json::json!({
                "status": status,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
