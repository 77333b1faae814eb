//! HTTP client for the session-cookie upstream service
//!
//! Every call takes the next credential from the shared [`CredentialPool`],
//! sends it as the `connect.sid` cookie alongside a fixed browser-like header
//! set, and checks the final URL for a login redirect before looking at the
//! status code.

use crate::config::UpstreamConfig;
use crate::credentials::{Credential, CredentialPool};
use crate::error::{Error, Result};
use crate::poll::JobListing;
use crate::types::{JobRecord, SubmitAck, SubmitPayload, UploadAck};
use async_trait::async_trait;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, COOKIE, HeaderMap, HeaderValue, ORIGIN, PRAGMA, REFERER,
    USER_AGENT,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Browser user agent sent on every upstream and relay request
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36";

/// Path segment that marks a redirect to the upstream login page
const LOGIN_PATH_MARKER: &str = "/login";

/// Client for the upstream listing, submission, upload and statistics endpoints
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<CredentialPool>,
    list_timeout: Duration,
    submit_timeout: Duration,
    upload_timeout: Duration,
}

impl UpstreamClient {
    /// Create a client for the configured upstream
    pub fn new(config: &UpstreamConfig, credentials: Arc<CredentialPool>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            list_timeout: config.list_timeout,
            submit_timeout: config.submit_timeout,
            upload_timeout: config.upload_timeout,
        })
    }

    /// The credential pool this client rotates through
    pub fn credentials(&self) -> &CredentialPool {
        &self.credentials
    }

    /// Fetch the full job listing
    ///
    /// The listing arrives as a bare array, as `{ok: true, items: [...]}` or as
    /// `{data: [...]}`; all three are normalized to a record list.
    pub async fn list_jobs(&self) -> Result<Vec<JobRecord>> {
        let credential = self.credentials.next()?;
        let response = self
            .http
            .get(self.url("/api/videos"))
            .headers(self.headers(credential)?)
            .timeout(self.list_timeout)
            .send()
            .await?;

        let body: Value = Self::check(response, credential).await?.json().await?;
        Ok(parse_listing(body))
    }

    /// Submit a generation job
    pub async fn submit_job(&self, payload: &SubmitPayload) -> Result<SubmitAck> {
        let credential = self.credentials.next()?;
        tracing::info!(
            model = %payload.model,
            duration = payload.duration,
            ratio = %payload.ratio,
            image = payload.image.is_some(),
            "Submitting generation job"
        );

        let response = self
            .http
            .post(self.url("/api/video/create"))
            .headers(self.headers(credential)?)
            .json(payload)
            .timeout(self.submit_timeout)
            .send()
            .await?;

        Ok(SubmitAck(
            Self::check(response, credential).await?.json().await?,
        ))
    }

    /// Upload an image for image-to-video jobs
    pub async fn upload_image(
        &self,
        file_name: String,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadAck> {
        let credential = self.credentials.next()?;
        tracing::info!(file_name = %file_name, size = bytes.len(), "Uploading image");

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        // multipart sets its own content-type with the boundary
        let response = self
            .http
            .post(self.url("/api/upload"))
            .headers(self.headers(credential)?)
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await?;

        Ok(UploadAck(
            Self::check(response, credential).await?.json().await?,
        ))
    }

    /// Fetch the upstream video statistics, passed through unchanged
    pub async fn video_count(&self) -> Result<Value> {
        let credential = self.credentials.next()?;
        let response = self
            .http
            .get(self.url("/api/stats/video-count"))
            .headers(self.headers(credential)?)
            .timeout(self.list_timeout)
            .send()
            .await?;

        Ok(Self::check(response, credential).await?.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn headers(&self, credential: &Credential) -> Result<HeaderMap> {
        tracing::debug!(credential = %credential, "Using upstream credential");

        let invalid = |what: &str| Error::Config {
            message: format!("{what} contains characters not allowed in a header"),
            key: None,
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("connect.sid={}", credential.expose()))
                .map_err(|_| invalid("session credential"))?,
        );
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(&self.base_url).map_err(|_| invalid("base URL"))?,
        );
        headers.insert(
            REFERER,
            HeaderValue::from_str(&format!("{}/", self.base_url))
                .map_err(|_| invalid("base URL"))?,
        );
        Ok(headers)
    }

    /// Turn login redirects and non-success statuses into errors
    async fn check(response: reqwest::Response, credential: &Credential) -> Result<reqwest::Response> {
        if response.url().path().contains(LOGIN_PATH_MARKER) {
            tracing::warn!(
                credential = %credential,
                url = %response.url(),
                "Upstream redirected to login, session expired"
            );
            return Err(Error::UpstreamSessionExpired {
                url: response.url().to_string(),
            });
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Upstream returned an error status");
            return Err(Error::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl JobListing for UpstreamClient {
    async fn fetch_listing(&self) -> Result<Vec<JobRecord>> {
        self.list_jobs().await
    }
}

/// Normalize the three listing shapes to a record list.
///
/// Entries that are not objects are skipped.
pub fn parse_listing(body: Value) -> Vec<JobRecord> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let ok = map.get("ok").and_then(Value::as_bool).unwrap_or(false);
            let key = if ok { "items" } else { "data" };
            match map.remove(key) {
                Some(Value::Array(items)) => items,
                Some(other) => {
                    tracing::warn!(key, kind = %json_kind(&other), "Listing field is not an array");
                    Vec::new()
                }
                None => Vec::new(),
            }
        }
        other => {
            tracing::warn!(kind = %json_kind(&other), "Unexpected listing body");
            Vec::new()
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<JobRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed listing entry");
                None
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Content type used when an uploaded file does not declare one
pub const DEFAULT_UPLOAD_CONTENT_TYPE: &str = "image/png";
