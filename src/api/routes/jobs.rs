//! Job handlers: submission, listing, status, statistics and completion waits.

use super::upload::read_file_field;
use super::{CreateWithImageQuery, upstream_failure};
use crate::Result;
use crate::api::AppState;
use crate::matcher::find_match;
use crate::poll::{PollOutcome, PollSession};
use crate::types::{
    StatsResponse, SubmitPayload, VideoCreateRequest, VideoCreateResponse, VideoListResponse,
    VideoStatusResponse, WaitQuery, WaitResponse, WaitStatus,
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use serde_json::json;
use std::time::Duration;

fn submit_payload(state: &AppState, request: &VideoCreateRequest) -> SubmitPayload {
    SubmitPayload {
        model: request
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| state.config.upstream.default_model.clone()),
        prompt: request.prompt.clone(),
        duration: request.duration,
        ratio: request.ratio.clone(),
        image: request.image.clone(),
    }
}

/// POST /api/video/create - Submit a generation job
#[utoipa::path(
    post,
    path = "/api/video/create",
    tag = "jobs",
    request_body = VideoCreateRequest,
    responses(
        (status = 200, description = "Submission outcome; success=false when the upstream refused it", body = VideoCreateResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Missing authorization or no upstream credentials"),
        (status = 403, description = "Invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_video(
    State(state): State<AppState>,
    Json(request): Json<VideoCreateRequest>,
) -> Result<Json<VideoCreateResponse>> {
    request.validate()?;
    let payload = submit_payload(&state, &request);

    let response = match state.upstream.submit_job(&payload).await {
        Ok(ack) => VideoCreateResponse {
            success: true,
            message: format!("video job submitted ({})", request.mode()),
            data: Some(ack.0),
        },
        Err(e) => {
            let (message, data) = upstream_failure("create", e)?;
            VideoCreateResponse {
                success: false,
                message,
                data: Some(data),
            }
        }
    };

    Ok(Json(response))
}

/// POST /api/video/create-with-image - Upload an image, then submit an image-to-video job
#[utoipa::path(
    post,
    path = "/api/video/create-with-image",
    tag = "jobs",
    params(CreateWithImageQuery),
    request_body(content = Vec<u8>, description = "Image file in the 'file' field (multipart/form-data)", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Outcome; data carries image_url and video_task on success", body = VideoCreateResponse),
        (status = 400, description = "Invalid request or missing file"),
        (status = 401, description = "Missing authorization or no upstream credentials"),
        (status = 403, description = "Invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_video_with_image(
    State(state): State<AppState>,
    Query(query): Query<CreateWithImageQuery>,
    mut multipart: Multipart,
) -> Result<Json<VideoCreateResponse>> {
    let mut request = VideoCreateRequest {
        model: query.model,
        prompt: query.prompt,
        duration: query.duration.unwrap_or(5),
        ratio: query.radio.unwrap_or_else(|| "16:9".to_string()),
        image: None,
    };
    request.validate()?;

    let file = read_file_field(&mut multipart).await?;

    let ack = match state
        .upstream
        .upload_image(file.file_name, file.bytes, &file.content_type)
        .await
    {
        Ok(ack) => ack,
        Err(e) => {
            let (message, data) = upstream_failure("image upload", e)?;
            return Ok(Json(VideoCreateResponse {
                success: false,
                message,
                data: Some(data),
            }));
        }
    };

    let Some(image_url) = ack.url().map(str::to_string) else {
        return Ok(Json(VideoCreateResponse {
            success: false,
            message: "upload succeeded but returned no image URL".to_string(),
            data: Some(ack.0),
        }));
    };

    request.image = Some(image_url.clone());
    let payload = submit_payload(&state, &request);

    let response = match state.upstream.submit_job(&payload).await {
        Ok(task) => VideoCreateResponse {
            success: true,
            message: format!("video job submitted ({})", request.mode()),
            data: Some(json!({"image_url": image_url, "video_task": task.0})),
        },
        Err(e) => {
            let (message, data) = upstream_failure("create", e)?;
            VideoCreateResponse {
                success: false,
                message,
                data: Some(data),
            }
        }
    };

    Ok(Json(response))
}

/// GET /api/videos - List all jobs of the upstream account
#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "jobs",
    responses(
        (status = 200, description = "Normalized job listing", body = VideoListResponse),
        (status = 401, description = "Missing authorization or no upstream credentials"),
        (status = 403, description = "Invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_videos(State(state): State<AppState>) -> Result<Json<VideoListResponse>> {
    let response = match state.upstream.list_jobs().await {
        Ok(records) => VideoListResponse {
            success: true,
            data: Some(records),
            message: None,
        },
        Err(e) => {
            let (message, _) = upstream_failure("list", e)?;
            VideoListResponse {
                success: false,
                data: None,
                message: Some(message),
            }
        }
    };

    Ok(Json(response))
}

/// GET /api/stats/video-count - Upstream job statistics
#[utoipa::path(
    get,
    path = "/api/stats/video-count",
    tag = "jobs",
    responses(
        (status = 200, description = "Upstream statistics, passed through", body = StatsResponse),
        (status = 401, description = "Missing authorization or no upstream credentials"),
        (status = 403, description = "Invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = []))
)]
pub async fn video_count(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let response = match state.upstream.video_count().await {
        Ok(stats) => StatsResponse {
            success: true,
            data: Some(stats),
            message: None,
        },
        Err(e) => {
            let (message, _) = upstream_failure("statistics", e)?;
            StatsResponse {
                success: false,
                data: None,
                message: Some(message),
            }
        }
    };

    Ok(Json(response))
}

/// GET /api/video/{id}/status - Status of one job from a single listing snapshot
#[utoipa::path(
    get,
    path = "/api/video/{id}/status",
    tag = "jobs",
    params(("id" = String, Path, description = "Task id or native id, optionally with a '::' suffix")),
    responses(
        (status = 200, description = "Matched record; success=false when not found", body = VideoStatusResponse),
        (status = 401, description = "Missing authorization or no upstream credentials"),
        (status = 403, description = "Invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = []))
)]
pub async fn video_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VideoStatusResponse>> {
    let records = match state.upstream.list_jobs().await {
        Ok(records) => records,
        Err(e) => {
            let (message, _) = upstream_failure("status query", e)?;
            return Ok(Json(VideoStatusResponse {
                success: false,
                status: None,
                video_url: None,
                data: None,
                message: Some(message),
            }));
        }
    };

    let response = match find_match(&id.as_str().into(), &records) {
        Some(found) => {
            tracing::debug!(id = %id, rule = ?found.rule, index = found.index, "Status lookup matched");
            VideoStatusResponse {
                success: true,
                status: found.record.status.clone(),
                video_url: found.record.artifact_url().map(str::to_string),
                data: Some(found.record.clone()),
                message: None,
            }
        }
        None => VideoStatusResponse {
            success: false,
            status: None,
            video_url: None,
            data: None,
            message: Some("video not found".to_string()),
        },
    };

    Ok(Json(response))
}

/// POST /api/video/create-and-wait - Submit a job and wait for it to finish
#[utoipa::path(
    post,
    path = "/api/video/create-and-wait",
    tag = "jobs",
    params(WaitQuery),
    request_body = VideoCreateRequest,
    responses(
        (status = 200, description = "Terminal outcome of the wait", body = WaitResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Missing authorization or no upstream credentials"),
        (status = 403, description = "Invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_and_wait(
    State(state): State<AppState>,
    Query(query): Query<WaitQuery>,
    Json(request): Json<VideoCreateRequest>,
) -> Result<Json<WaitResponse>> {
    request.validate()?;
    let payload = submit_payload(&state, &request);

    let ack = match state.upstream.submit_job(&payload).await {
        Ok(ack) => ack,
        Err(e) => {
            let (message, data) = upstream_failure("create", e)?;
            return Ok(Json(WaitResponse {
                message: Some(message),
                data: Some(data),
                ..unfinished_wait(None)
            }));
        }
    };

    let Some(task_id) = ack.task_id() else {
        return Ok(Json(WaitResponse {
            success: true,
            message: Some(
                "job created but no task id was returned, query its status manually".to_string(),
            ),
            data: Some(ack.0),
            ..unfinished_wait(None)
        }));
    };

    tracing::info!(task_id = %task_id, "Job submitted, waiting for completion");
    wait_until_terminal(&state, task_id, &query).await.map(Json)
}

/// GET /api/video/{id}/wait - Wait for an existing job to finish
#[utoipa::path(
    get,
    path = "/api/video/{id}/wait",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Task id or native id, optionally with a '::' suffix"),
        WaitQuery
    ),
    responses(
        (status = 200, description = "Terminal outcome of the wait", body = WaitResponse),
        (status = 400, description = "Invalid wait parameters"),
        (status = 401, description = "Missing authorization or no upstream credentials"),
        (status = 403, description = "Invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = []))
)]
pub async fn wait_for_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WaitQuery>,
) -> Result<Json<WaitResponse>> {
    wait_until_terminal(&state, id, &query).await.map(Json)
}

fn unfinished_wait(task_id: Option<String>) -> WaitResponse {
    WaitResponse {
        success: false,
        status: None,
        task_id,
        video_url: None,
        message: None,
        elapsed_seconds: None,
        ticks: None,
        data: None,
    }
}

async fn wait_until_terminal(
    state: &AppState,
    task_id: String,
    query: &WaitQuery,
) -> Result<WaitResponse> {
    let polling = &state.config.polling;
    let interval = query
        .poll_interval
        .map(Duration::from_secs)
        .unwrap_or(polling.poll_interval);
    let max_wait = query
        .max_wait_seconds
        .map(Duration::from_secs)
        .unwrap_or(polling.max_wait);

    let mut session = PollSession::new(task_id.as_str(), interval, max_wait)?;

    let outcome = match session.run(&*state.upstream).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let (message, data) = upstream_failure("wait", e)?;
            return Ok(WaitResponse {
                message: Some(message),
                elapsed_seconds: Some(session.elapsed().as_secs()),
                ticks: Some(session.ticks()),
                data: Some(data),
                ..unfinished_wait(Some(task_id))
            });
        }
    };

    let mut response = WaitResponse {
        elapsed_seconds: Some(session.elapsed().as_secs()),
        ticks: Some(session.ticks()),
        ..unfinished_wait(Some(task_id.clone()))
    };

    match outcome {
        PollOutcome::Completed { video_url, record } => {
            response.success = true;
            response.status = Some(WaitStatus::Completed);
            response.message = Some("video generation completed".to_string());
            response.video_url = video_url;
            response.data = Some(serde_json::to_value(record)?);
        }
        PollOutcome::Failed { message, record } => {
            response.status = Some(WaitStatus::Failed);
            response.message = Some(message);
            response.data = Some(serde_json::to_value(record)?);
        }
        PollOutcome::Timeout { .. } => {
            response.status = Some(WaitStatus::Timeout);
            response.message = Some(format!(
                "timed out after {}s waiting for task {}",
                max_wait.as_secs(),
                task_id
            ));
        }
    }

    Ok(response)
}
