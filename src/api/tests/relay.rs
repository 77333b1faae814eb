use super::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn proxy_uri(target: &str) -> String {
    format!("/proxy/{}", urlencoding::encode(target))
}

#[tokio::test]
async fn test_proxy_relays_body_and_headers() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v.mp4"))
        .and(query_param("a", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"videobytes".to_vec(), "video/mp4")
                .insert_header("content-disposition", "inline"),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let app = router_for(test_config(&upstream));
    let response = app
        .oneshot(get(&proxy_uri(&format!("{}/v.mp4?a=1", upstream.uri()))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    assert_eq!(header("content-type").as_deref(), Some("video/mp4"));
    assert_eq!(header("content-disposition").as_deref(), Some("inline"));
    assert_eq!(header("cache-control").as_deref(), Some("public, max-age=3600"));
    assert_eq!(header("access-control-allow-origin").as_deref(), Some("*"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"videobytes");
}

#[tokio::test]
async fn test_proxy_appends_inbound_query() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v.mp4"))
        .and(query_param("a", "1"))
        .and(query_param("sig", "xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .expect(1)
        .mount(&upstream)
        .await;

    let uri = format!("{}?sig=xyz", proxy_uri(&format!("{}/v.mp4?a=1", upstream.uri())));
    let (status, _) = send(router_for(test_config(&upstream)), get(&uri)).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_proxy_uses_configured_cache_max_age() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&upstream)
        .await;
    let mut config = test_config(&upstream);
    config.relay.cache_max_age = 60;

    let response = router_for(config)
        .oneshot(get(&proxy_uri(&format!("{}/a", upstream.uri()))))
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=60"
    );
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/octet-stream"
    );
}

#[tokio::test]
async fn test_proxy_passes_target_status_through() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;

    let (status, body) = send(
        router_for(test_config(&upstream)),
        get(&proxy_uri(&format!("{}/missing", upstream.uri()))),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "upstream_status");
}

#[tokio::test]
async fn test_proxy_timeout_is_gateway_timeout() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&upstream)
        .await;
    let mut config = test_config(&upstream);
    config.relay.timeout = Duration::from_millis(50);

    let (status, _) = send(
        router_for(config),
        get(&proxy_uri(&format!("{}/slow", upstream.uri()))),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_proxy_rejects_non_http_targets() {
    let upstream = MockServer::start().await;

    let (status, body) = send(
        router_for(test_config(&upstream)),
        get(&proxy_uri("javascript:alert(1)")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_url");
}
