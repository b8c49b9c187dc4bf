use axum::extract::multipart::{Field, MultipartError};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use mytodo_core::attachment::{Attachment, AttachmentUpload, FileUpload, MAX_UPLOAD_BYTES};
use mytodo_core::ValidationError;

use super::{error_body, to_error, ApiError, AppState};

/// Request bodies may exceed the upload limit so the handler can answer
/// with the size error instead of a bare 413.
const BODY_LIMIT: usize = 2 * MAX_UPLOAD_BYTES;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/tasks/{id}/attachments",
            get(list_attachments)
                .post(upload_attachment)
                .layer(DefaultBodyLimit::max(BODY_LIMIT)),
        )
        .route("/api/attachments/{id}", delete(delete_attachment))
}

async fn list_attachments(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<Vec<Attachment>>, ApiError> {
    state
        .service
        .list_attachments(task_id)
        .await
        .map(Json)
        .map_err(to_error)
}

fn too_large(size: usize) -> ApiError {
    error_body(
        StatusCode::BAD_REQUEST,
        ValidationError::FileTooLarge { size }.to_string(),
    )
}

/// Bodies past `BODY_LIMIT` surface as the same size error as any other
/// oversized upload.
fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large(BODY_LIMIT);
    }
    error_body(e.status(), e.body_text())
}

/// Read a file part, keeping at most `MAX_UPLOAD_BYTES`. Anything past the
/// limit is drained and discarded so the client still gets the size error.
async fn read_file_field(field: &mut Field<'_>) -> Result<Vec<u8>, ApiError> {
    let mut data = Vec::new();
    let mut size = 0usize;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len();
        if size <= MAX_UPLOAD_BYTES {
            data.extend_from_slice(&chunk);
        }
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(too_large(size));
    }
    Ok(data)
}

/// Take the first `file` or `url` field; other fields are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<AttachmentUpload, ApiError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = read_file_field(&mut field).await?;
                return Ok(AttachmentUpload::File(FileUpload {
                    filename,
                    content_type,
                    data: data.into(),
                }));
            }
            "url" => {
                let url = field.text().await.map_err(multipart_error)?;
                return Ok(AttachmentUpload::Url(url));
            }
            _ => continue,
        }
    }
    Err(error_body(
        StatusCode::BAD_REQUEST,
        "expected a 'file' or 'url' form field",
    ))
}

async fn upload_attachment(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Attachment>), ApiError> {
    let upload = read_upload(multipart).await?;
    state
        .service
        .add_attachment(task_id, upload)
        .await
        .map(|a| (StatusCode::CREATED, Json(a)))
        .map_err(to_error)
}

async fn delete_attachment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_attachment(id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}
