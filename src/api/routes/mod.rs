//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`jobs`] - Job submission, listing, status and completion waits
//! - [`upload`] - Image upload
//! - [`relay`] - Artifact relay
//! - [`system`] - Service info, health, OpenAPI

use crate::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

mod jobs;
mod relay;
mod system;
mod upload;

// Re-export all handlers so `routes::function_name` works
pub use jobs::*;
pub use relay::*;
pub use system::*;
pub use upload::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Query parameters for POST /api/video/create-with-image
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CreateWithImageQuery {
    /// Text prompt describing the video
    pub prompt: String,
    /// Model name (default: configured default model)
    pub model: Option<String>,
    /// Duration in seconds, 1..=10 (default: 5)
    pub duration: Option<u32>,
    /// Aspect ratio (default: "16:9")
    #[serde(alias = "ratio")]
    pub radio: Option<String>,
}

// ============================================================================
// Envelope helpers
// ============================================================================

/// Split an upstream failure into the message and data of a `success=false`
/// envelope. Errors the upstream did not report are handed back unchanged.
pub(crate) fn upstream_failure(action: &str, error: Error) -> Result<(String, Value), Error> {
    match error {
        Error::UpstreamSessionExpired { url } => Ok((
            format!("{action} failed: upstream session expired or invalid, update DOUBAO_SESSION_COOKIE"),
            json!({"error": "redirected to login page", "url": url}),
        )),
        Error::UpstreamHttp { status, body } => Ok((
            format!("{action} failed: upstream returned {status}"),
            json!({"error": body}),
        )),
        other => Err(other),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expiry_becomes_envelope() {
        let (message, data) = upstream_failure(
            "create",
            Error::UpstreamSessionExpired {
                url: "https://up/login".into(),
            },
        )
        .unwrap();

        assert!(message.starts_with("create failed"));
        assert_eq!(data["url"], "https://up/login");
    }

    #[test]
    fn upstream_status_is_in_the_message() {
        let (message, data) = upstream_failure(
            "list",
            Error::UpstreamHttp {
                status: 500,
                body: "oops".into(),
            },
        )
        .unwrap();

        assert!(message.contains("500"));
        assert_eq!(data["error"], "oops");
    }

    #[test]
    fn other_errors_pass_through() {
        let result = upstream_failure("list", Error::NoCredentialsAvailable);
        assert!(matches!(result, Err(Error::NoCredentialsAvailable)));
    }
}
