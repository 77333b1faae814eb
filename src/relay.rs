//! Server-side artifact relay
//!
//! Callers that cannot reach the artifact host directly ask this service to
//! fetch it for them. The target arrives percent-encoded in the request path,
//! any query string on the inbound request is appended, and the body is
//! buffered and handed back with a reduced, cache-friendly header set.

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::upstream::BROWSER_USER_AGENT;
use axum::body::Bytes;
use reqwest::StatusCode;
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap,
    HeaderName, HeaderValue, USER_AGENT,
};
use url::Url;

/// Content type reported when the target declares none
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Characters of the target URL written to the log
const LOGGED_URL_CHARS: usize = 100;

/// A reconstructed absolute relay target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    url: Url,
}

impl ProxyTarget {
    /// Rebuild the target from the encoded path fragment and the inbound query.
    ///
    /// The fragment is percent-decoded once. A non-empty `query` is appended
    /// with `&` when the decoded URL already has a query, `?` otherwise.
    ///
    /// # Errors
    ///
    /// [`RelayError::InvalidUrl`] when decoding fails, the result does not
    /// parse, or the scheme is not http/https.
    pub fn build(encoded: &str, query: Option<&str>) -> Result<Self> {
        let decoded = urlencoding::decode(encoded).map_err(|_| RelayError::InvalidUrl {
            url: encoded.to_string(),
        })?;

        let full = match query.filter(|q| !q.is_empty()) {
            Some(query) if decoded.contains('?') => format!("{decoded}&{query}"),
            Some(query) => format!("{decoded}?{query}"),
            None => decoded.into_owned(),
        };

        let invalid = || RelayError::InvalidUrl { url: full.clone() };
        let url = Url::parse(&full).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(invalid().into());
        }

        Ok(Self { url })
    }

    /// The reconstructed URL
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Leading part of the URL, for logs
    pub fn log_prefix(&self) -> String {
        self.url.as_str().chars().take(LOGGED_URL_CHARS).collect()
    }
}

/// A fetched artifact ready to hand back to the caller
#[derive(Debug, Clone)]
pub struct RelayResponse {
    /// Content type of the target, or [`DEFAULT_CONTENT_TYPE`]
    pub content_type: String,
    /// Content-Length of the target, when it sent one
    pub content_length: Option<String>,
    /// Content-Disposition of the target, when it sent one
    pub content_disposition: Option<String>,
    /// `max-age` for the public cache directive
    pub cache_max_age: u64,
    /// Buffered body
    pub body: Bytes,
}

/// Fetches relay targets
pub struct RelayFetcher {
    http: reqwest::Client,
    cache_max_age: u64,
}

impl RelayFetcher {
    /// Create a fetcher using the relay timeout and cache settings
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            http,
            cache_max_age: config.cache_max_age,
        })
    }

    /// Fetch the target and buffer its body
    ///
    /// # Errors
    ///
    /// - [`RelayError::UpstreamStatus`] for any status other than 200
    /// - [`RelayError::GatewayTimeout`] when the relay timeout elapses
    /// - [`RelayError::BadGateway`] for other transport failures
    pub async fn fetch(&self, target: &ProxyTarget) -> Result<RelayResponse> {
        tracing::info!(target_url = %target.log_prefix(), "Relaying resource");

        let response = self
            .http
            .get(target.url.clone())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(
                target_url = %target.log_prefix(),
                status = status.as_u16(),
                "Relay target returned an error status"
            );
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
            }
            .into());
        }

        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE).unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let content_length = header(CONTENT_LENGTH);
        let content_disposition = header(CONTENT_DISPOSITION);

        let body = response.bytes().await.map_err(transport_error)?;
        tracing::debug!(bytes = body.len(), content_type = %content_type, "Relay fetch complete");

        Ok(RelayResponse {
            content_type,
            content_length,
            content_disposition,
            cache_max_age: self.cache_max_age,
            body,
        })
    }
}

fn transport_error(e: reqwest::Error) -> crate::Error {
    if e.is_timeout() {
        tracing::warn!(error = %e, "Relay request timed out");
        RelayError::GatewayTimeout.into()
    } else {
        tracing::warn!(error = %e, "Relay request failed");
        RelayError::BadGateway {
            reason: e.to_string(),
        }
        .into()
    }
}
