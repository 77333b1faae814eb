//! Artifact relay handler.

use crate::Result;
use crate::api::AppState;
use crate::relay::{ProxyTarget, RelayResponse};
use axum::{
    extract::{OriginalUri, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

const PROXY_PREFIX: &str = "/proxy/";

/// GET /proxy/{url} - Fetch a resource on the caller's behalf
///
/// The target URL is taken percent-encoded from the raw request path; the
/// request's own query string is appended to it verbatim.
#[utoipa::path(
    get,
    path = "/proxy/{url}",
    tag = "relay",
    params(("url" = String, Path, description = "Percent-encoded absolute http(s) URL")),
    responses(
        (status = 200, description = "Resource body with the target's content type", content_type = "application/octet-stream"),
        (status = 400, description = "Target is not an http(s) URL", body = crate::error::ApiError),
        (status = 502, description = "Target unreachable", body = crate::error::ApiError),
        (status = 504, description = "Target timed out", body = crate::error::ApiError)
    )
)]
pub async fn proxy_resource(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<RelayResponse> {
    let encoded = uri.path().strip_prefix(PROXY_PREFIX).unwrap_or_default();
    let target = ProxyTarget::build(encoded, uri.query())?;
    state.relay.fetch(&target).await
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, self.body).into_response();
        let headers = response.headers_mut();

        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or(HeaderValue::from_static(crate::relay::DEFAULT_CONTENT_TYPE));
        headers.insert(header::CONTENT_TYPE, content_type);
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        if let Ok(cache) = HeaderValue::from_str(&format!("public, max-age={}", self.cache_max_age)) {
            headers.insert(header::CACHE_CONTROL, cache);
        }
        if let Some(length) = self.content_length.and_then(|v| HeaderValue::from_str(&v).ok()) {
            headers.insert(header::CONTENT_LENGTH, length);
        }
        if let Some(disposition) = self
            .content_disposition
            .and_then(|v| HeaderValue::from_str(&v).ok())
        {
            headers.insert(header::CONTENT_DISPOSITION, disposition);
        }

        response
    }
}
