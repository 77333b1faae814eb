//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the video-relay REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the video-relay REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "video-relay REST API",
        version = "0.1.0",
        description = "Submit video generation jobs to a session-cookie upstream, wait for completion, and relay the produced artifacts",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Jobs
        crate::api::routes::create_video,
        crate::api::routes::create_video_with_image,
        crate::api::routes::create_and_wait,
        crate::api::routes::list_videos,
        crate::api::routes::video_count,
        crate::api::routes::video_status,
        crate::api::routes::wait_for_video,

        // Upload
        crate::api::routes::upload_image,

        // Relay
        crate::api::routes::proxy_resource,

        // System
        crate::api::routes::service_info,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::JobStatus,
        crate::types::VideoCreateRequest,
        crate::types::VideoCreateResponse,
        crate::types::UploadResponse,
        crate::types::VideoListResponse,
        crate::types::VideoStatusResponse,
        crate::types::StatsResponse,
        crate::types::WaitStatus,
        crate::types::WaitResponse,
        crate::types::WaitQuery,

        // API request types from routes
        crate::api::routes::CreateWithImageQuery,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "jobs", description = "Generation jobs - Submit, list, query status, and wait for completion"),
        (name = "upload", description = "Image upload for image-to-video jobs"),
        (name = "relay", description = "Artifact relay - Fetch an upstream resource on the caller's behalf"),
        (name = "system", description = "System endpoints - Service info, health checks, OpenAPI spec"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security addon to add the bearer token scheme to the OpenAPI spec
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
