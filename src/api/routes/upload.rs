//! Image upload handler.

use super::upstream_failure;
use crate::Result;
use crate::api::AppState;
use crate::error::Error;
use crate::types::UploadResponse;
use crate::upstream::DEFAULT_UPLOAD_CONTENT_TYPE;
use axum::{
    Json,
    extract::{Multipart, State},
};

/// A file read from the `file` field of a multipart request
pub(crate) struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Read the `file` field; other fields are ignored
pub(crate) async fn read_file_field(multipart: &mut Multipart) -> Result<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.png").to_string();
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_UPLOAD_CONTENT_TYPE)
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::Validation(format!("failed to read file: {e}")))?;

        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(Error::Validation(
        "no file provided in 'file' field".to_string(),
    ))
}

/// POST /api/upload - Upload an image for image-to-video jobs
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "upload",
    request_body(content = Vec<u8>, description = "Image file in the 'file' field (multipart/form-data)", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload outcome; success=false when the upstream refused it", body = UploadResponse),
        (status = 400, description = "No file in the request"),
        (status = 401, description = "Missing authorization or no upstream credentials"),
        (status = 403, description = "Invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let file = read_file_field(&mut multipart).await?;

    let ack = match state
        .upstream
        .upload_image(file.file_name, file.bytes, &file.content_type)
        .await
    {
        Ok(ack) => ack,
        Err(e) => {
            let (message, data) = upstream_failure("upload", e)?;
            return Ok(Json(UploadResponse {
                success: false,
                message,
                url: None,
                data: Some(data),
            }));
        }
    };

    let response = match (ack.accepted(), ack.url()) {
        (true, Some(url)) => UploadResponse {
            success: true,
            message: "upload succeeded".to_string(),
            url: Some(url.to_string()),
            data: Some(ack.0.clone()),
        },
        _ => UploadResponse {
            success: false,
            message: ack.message().unwrap_or("upload failed").to_string(),
            url: None,
            data: Some(ack.0.clone()),
        },
    };

    Ok(Json(response))
}
