//! REST API server module
//!
//! Exposes job submission, completion waits, image upload and the artifact
//! relay over HTTP, with an OpenAPI description and optional bearer-token
//! authorization on the `/api/*` routes.

use crate::{Config, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Jobs (authorization applies)
/// - `POST /api/video/create` - Submit a generation job
/// - `POST /api/video/create-with-image` - Upload an image, then submit
/// - `POST /api/video/create-and-wait` - Submit and wait for completion
/// - `GET /api/videos` - List jobs
/// - `GET /api/stats/video-count` - Upstream statistics
/// - `GET /api/video/:id/status` - Status of one job
/// - `GET /api/video/:id/wait` - Wait for an existing job
/// - `POST /api/upload` - Upload an image
///
/// The two upload routes accept bodies up to `ApiConfig::max_upload_bytes`;
/// every other route keeps axum's default limit.
///
/// ## Open routes
/// - `GET /` - Service information
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /proxy/*url` - Artifact relay
pub fn create_router(state: AppState) -> Router {
    let api_config = &state.config.server.api;
    let upload_limit = DefaultBodyLimit::max(api_config.max_upload_bytes);

    let jobs = Router::new()
        .route(
            "/api/upload",
            post(routes::upload_image).layer(upload_limit),
        )
        .route("/api/video/create", post(routes::create_video))
        .route(
            "/api/video/create-with-image",
            post(routes::create_video_with_image).layer(upload_limit),
        )
        .route("/api/video/create-and-wait", post(routes::create_and_wait))
        .route("/api/videos", get(routes::list_videos))
        .route("/api/stats/video-count", get(routes::video_count))
        .route("/api/video/:id/status", get(routes::video_status))
        .route("/api/video/:id/wait", get(routes::wait_for_video));

    // route_layer keeps unmatched paths a 404 rather than a 401
    let jobs = if api_config.auth_enabled() {
        let tokens = Arc::new(api_config.auth_tokens.clone());
        jobs.route_layer(middleware::from_fn_with_state(
            tokens,
            auth::require_bearer_token,
        ))
    } else {
        jobs
    };

    let router = Router::new()
        .route("/", get(routes::service_info))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/proxy/*url", get(routes::proxy_resource))
        .merge(jobs);

    // Swagger UI serves its own copy of the spec; /openapi.json is taken above
    let router = if api_config.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let cors = api_config
        .cors_enabled
        .then(|| build_cors_layer(&api_config.cors_origins));

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` anywhere in the list, or an empty list, allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until SIGTERM or SIGINT (Ctrl+C) is received, then lets in-flight
/// requests finish.
///
/// # Example
///
/// ```no_run
/// use video_relay::Config;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::from_env()?);
///
/// // Start API server (blocks until shutdown)
/// video_relay::api::start_api_server(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(config: Arc<Config>) -> Result<()> {
    serve_until(config, crate::wait_for_signal()).await
}

/// Start the API server and stop it when `shutdown` completes
pub async fn serve_until<F>(config: Arc<Config>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = config.server.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let state = AppState::from_config(config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
