//! Relay server example
//!
//! Runs the REST API with configuration taken from the environment (and a
//! `.env` file, when present).
//!
//! Recognized variables:
//! - `DOUBAO_SESSION_COOKIE` - comma-separated session credentials (required for upstream calls)
//! - `DOUBAO_BASE_URL` - upstream base URL
//! - `AUTH_TOKEN` - comma-separated bearer tokens; unset disables authorization
//! - `API_HOST` / `API_PORT` - bind address (default 0.0.0.0:8000)
//! - `RUST_LOG` - log filter (default `info`)
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:8000/swagger-ui
//! - Submit a job via POST http://localhost:8000/api/video/create
//! - Wait for it via GET http://localhost:8000/api/video/{id}/wait

use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use video_relay::Config;
use video_relay::api::start_api_server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    if config.upstream.credentials.is_empty() {
        tracing::warn!("DOUBAO_SESSION_COOKIE is not set; upstream calls will be rejected");
    }

    let address = config.server.api.bind_address;
    println!("video-relay listening on http://{address}");
    println!("Swagger UI: http://{address}/swagger-ui");
    println!();
    println!("Example commands:");
    println!("  curl -X POST http://{address}/api/video/create \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"prompt\": \"cat running\", \"duration\": 5, \"radio\": \"16:9\"}}'");
    println!("  curl http://{address}/api/video/<task-id>/wait");

    // Runs until Ctrl+C or SIGTERM
    start_api_server(Arc::new(config)).await?;

    Ok(())
}
