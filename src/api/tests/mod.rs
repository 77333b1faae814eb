use super::*;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::MockServer;

mod jobs;
mod relay;

const TEST_CREDENTIAL: &str = "test-session-cookie";
const MULTIPART_BOUNDARY: &str = "video-relay-test-boundary";

/// Config pointing at `upstream` with one credential and millisecond polling
fn test_config(upstream: &MockServer) -> Config {
    let mut config = Config::default();
    config.upstream.base_url = upstream.uri();
    config.upstream.credentials = vec![TEST_CREDENTIAL.to_string()];
    config.polling.poll_interval = Duration::from_millis(5);
    config.polling.max_wait = Duration::from_millis(200);
    config
}

fn router_for(config: Config) -> Router {
    create_router(AppState::from_config(Arc::new(config)).unwrap())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into()))
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_file(uri: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_api_server_stops_on_shutdown_signal() {
    let upstream = MockServer::start().await;
    let mut config = test_config(&upstream);
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve_until(Arc::new(config), async move {
        stop_rx.await.ok();
    }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let upstream = MockServer::start().await;
    let app = router_for(test_config(&upstream));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_cors_specific_origins() {
    let upstream = MockServer::start().await;
    let mut config = test_config(&upstream);
    config.server.api.cors_origins = vec!["http://allowed.example".to_string()];
    let app = router_for(config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://allowed.example")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://allowed.example")
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let upstream = MockServer::start().await;
    let mut config = test_config(&upstream);
    config.server.api.cors_enabled = false;
    let app = router_for(config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_auth_gates_api_routes_only() {
    let upstream = MockServer::start().await;
    let mut config = test_config(&upstream);
    config.server.api.auth_tokens = vec!["secret".to_string()];
    let app = router_for(config);

    let (status, _) = send(app.clone(), get("/api/videos")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forbidden = Request::builder()
        .uri("/api/videos")
        .header("Authorization", "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.clone(), forbidden).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "invalid_token");

    for open in ["/", "/health", "/openapi.json"] {
        let (status, _) = send(app.clone(), get(open)).await;
        assert_eq!(status, StatusCode::OK, "{open} should not require a token");
    }

    // The relay is never gated; an invalid target proves the handler ran
    let (status, body) = send(app, get("/proxy/ftp%3A%2F%2Fexample.com%2Fx")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_url");
}

#[tokio::test]
async fn test_unknown_api_path_is_not_found_even_with_auth() {
    let upstream = MockServer::start().await;
    let mut config = test_config(&upstream);
    config.server.api.auth_tokens = vec!["secret".to_string()];

    let (status, _) = send(router_for(config), get("/api/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let upstream = MockServer::start().await;

    let (enabled, _) = send(
        router_for(test_config(&upstream)),
        get("/api-docs/openapi.json"),
    )
    .await;
    assert_eq!(enabled, StatusCode::OK);

    let mut config = test_config(&upstream);
    config.server.api.swagger_ui = false;
    let (disabled, _) = send(router_for(config), get("/api-docs/openapi.json")).await;
    assert_eq!(disabled, StatusCode::NOT_FOUND);
}
