//! System handlers: service info, health, OpenAPI.

use crate::api::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

/// GET / - Service information
#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses(
        (status = 200, description = "Service name, version, credential count and endpoint list")
    )
)]
pub async fn service_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": "video-relay",
        "version": env!("CARGO_PKG_VERSION"),
        "credential_count": state.upstream.credentials().len(),
        "load_balance": "round-robin",
        "auth_enabled": state.config.server.api.auth_enabled(),
        "endpoints": {
            "upload": "POST /api/upload",
            "create_video": "POST /api/video/create",
            "create_with_image": "POST /api/video/create-with-image",
            "create_and_wait": "POST /api/video/create-and-wait",
            "list_videos": "GET /api/videos",
            "video_count": "GET /api/stats/video-count",
            "video_status": "GET /api/video/{id}/status",
            "video_wait": "GET /api/video/{id}/wait",
            "proxy": "GET /proxy/{url}"
        }
    }))
}

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}
