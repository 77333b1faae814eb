use super::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_listing(upstream: &MockServer, listing: Value) {
    Mock::given(method("GET"))
        .and(path("/api/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .mount(upstream)
        .await;
}

#[tokio::test]
async fn test_create_video_fills_default_model_and_reports_mode() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/video/create"))
        .and(header("cookie", format!("connect.sid={TEST_CREDENTIAL}").as_str()))
        .and(body_json(json!({
            "model": "seedance-1-5-pro-251215",
            "prompt": "cat running",
            "duration": 5,
            "radio": "16:9"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"taskId": "task_001"})))
        .expect(1)
        .mount(&upstream)
        .await;

    let (status, body) = send(
        router_for(test_config(&upstream)),
        post_json("/api/video/create", json!({"prompt": "cat running"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("text-to-video"));
    assert_eq!(body["data"]["taskId"], "task_001");
}

#[tokio::test]
async fn test_create_video_with_image_url_is_image_to_video() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/video/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
        .mount(&upstream)
        .await;

    let (_, body) = send(
        router_for(test_config(&upstream)),
        post_json(
            "/api/video/create",
            json!({"prompt": "waves", "radio": "9:16", "image": "https://img/x.png"}),
        ),
    )
    .await;

    assert!(body["message"].as_str().unwrap().contains("image-to-video"));
}

#[tokio::test]
async fn test_create_video_rejects_invalid_requests() {
    let upstream = MockServer::start().await;
    let app = router_for(test_config(&upstream));

    let (status, body) = send(app.clone(), post_json("/api/video/create", json!({"prompt": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");

    let (status, _) = send(
        app,
        post_json("/api/video/create", json!({"prompt": "x", "duration": 11})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_video_session_expired_is_envelope() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/video/create"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/login", upstream.uri()).as_str()),
        )
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("login"))
        .mount(&upstream)
        .await;

    let (status, body) = send(
        router_for(test_config(&upstream)),
        post_json("/api/video/create", json!({"prompt": "cat"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("session expired"));
}

#[tokio::test]
async fn test_no_credentials_is_unauthorized() {
    let upstream = MockServer::start().await;
    let mut config = test_config(&upstream);
    config.upstream.credentials.clear();

    let (status, body) = send(router_for(config), get("/api/videos")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "no_credentials");
}

#[tokio::test]
async fn test_list_videos_normalizes_ok_items_shape() {
    let upstream = MockServer::start().await;
    mount_listing(
        &upstream,
        json!({"ok": true, "items": [{"id": 1, "taskId": "a", "extra": "kept"}]}),
    )
    .await;

    let (status, body) = send(router_for(test_config(&upstream)), get("/api/videos")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["taskId"], "a");
    assert_eq!(body["data"][0]["extra"], "kept");
}

#[tokio::test]
async fn test_list_videos_upstream_error_is_envelope() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/videos"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;

    let (status, body) = send(router_for(test_config(&upstream)), get("/api/videos")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_video_count_passes_statistics_through() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stats/video-count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 12, "today": 3})))
        .mount(&upstream)
        .await;

    let (_, body) = send(
        router_for(test_config(&upstream)),
        get("/api/stats/video-count"),
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 12);
}

#[tokio::test]
async fn test_video_status_matches_suffixed_identifier() {
    let upstream = MockServer::start().await;
    mount_listing(
        &upstream,
        json!([
            {"id": 1, "taskId": "other", "status": "processing"},
            {"id": 2, "taskId": "abc123", "status": "succeeded", "video_url": "https://cdn/v.mp4"}
        ]),
    )
    .await;

    let (_, body) = send(
        router_for(test_config(&upstream)),
        get("/api/video/abc123::seedance/status"),
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "succeeded");
    assert_eq!(body["video_url"], "https://cdn/v.mp4");
    assert_eq!(body["data"]["id"], 2);
}

#[tokio::test]
async fn test_video_status_not_found() {
    let upstream = MockServer::start().await;
    mount_listing(&upstream, json!([{"id": 1, "taskId": "zzz"}])).await;

    let (status, body) = send(
        router_for(test_config(&upstream)),
        get("/api/video/abc/status"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "video not found");
}

#[tokio::test]
async fn test_create_and_wait_completes() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/video/create"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"task": {"task_id": "task_001"}})),
        )
        .mount(&upstream)
        .await;
    mount_listing(
        &upstream,
        json!([{"id": 9, "taskId": "task_001", "status": "completed", "url": "https://cdn/a.mp4"}]),
    )
    .await;

    let (status, body) = send(
        router_for(test_config(&upstream)),
        post_json("/api/video/create-and-wait", json!({"prompt": "cat running"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["task_id"], "task_001");
    assert_eq!(body["video_url"], "https://cdn/a.mp4");
    assert_eq!(body["ticks"], 1);
}

#[tokio::test]
async fn test_create_and_wait_without_task_id() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/video/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&upstream)
        .await;

    let (_, body) = send(
        router_for(test_config(&upstream)),
        post_json("/api/video/create-and-wait", json!({"prompt": "cat"})),
    )
    .await;

    assert_eq!(body["success"], true);
    assert!(body.get("status").is_none());
    assert!(body["message"].as_str().unwrap().contains("no task id"));
    assert_eq!(body["data"]["ok"], true);
}

#[tokio::test]
async fn test_wait_times_out() {
    let upstream = MockServer::start().await;
    mount_listing(&upstream, json!([{"taskId": "t1", "status": "processing"}])).await;
    let mut config = test_config(&upstream);
    config.polling.max_wait = Duration::from_millis(20);

    let (_, body) = send(router_for(config), get("/api/video/t1/wait")).await;

    assert_eq!(body["success"], false);
    assert_eq!(body["status"], "timeout");
    assert!(body["message"].as_str().unwrap().contains("timed out"));
    assert_eq!(body["ticks"], 4);
}

#[tokio::test]
async fn test_wait_reports_failure_message() {
    let upstream = MockServer::start().await;
    mount_listing(
        &upstream,
        json!([{"taskId": "t1", "status": "failed", "message": "content rejected"}]),
    )
    .await;

    let (_, body) = send(router_for(test_config(&upstream)), get("/api/video/t1/wait")).await;

    assert_eq!(body["success"], false);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["message"], "content rejected");
}

#[tokio::test]
async fn test_wait_rejects_zero_poll_interval() {
    let upstream = MockServer::start().await;

    let (status, _) = send(
        router_for(test_config(&upstream)),
        get("/api/video/t1/wait?poll_interval=0"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wait_upstream_failure_is_envelope() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/videos"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&upstream)
        .await;

    let (status, body) = send(router_for(test_config(&upstream)), get("/api/video/t1/wait")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["task_id"], "t1");
    assert_eq!(body["ticks"], 0);
}

#[tokio::test]
async fn test_create_with_image_uploads_then_submits() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "url": "https://img/up.png"})),
        )
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/video/create"))
        .and(body_json(json!({
            "model": "seedance-1-5-pro-251215",
            "prompt": "sunrise",
            "duration": 5,
            "radio": "1:1",
            "image": "https://img/up.png"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"taskId": "t9"})))
        .expect(1)
        .mount(&upstream)
        .await;

    let (status, body) = send(
        router_for(test_config(&upstream)),
        post_file(
            "/api/video/create-with-image?prompt=sunrise&radio=1:1",
            "up.png",
            b"\x89PNG",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["image_url"], "https://img/up.png");
    assert_eq!(body["data"]["video_task"]["taskId"], "t9");
}

#[tokio::test]
async fn test_create_with_image_without_upload_url() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&upstream)
        .await;

    let (_, body) = send(
        router_for(test_config(&upstream)),
        post_file("/api/video/create-with-image?prompt=sunrise", "up.png", b"img"),
    )
    .await;

    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("no image URL"));
}
