use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use mytodo_store::content_type_for_key;

use super::{to_error, ApiError, AppState};

const CACHE_FOREVER: &str = "public, max-age=31536000";

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/files/{*key}", get(read_file))
}

/// Keys embed the upload time and are never rewritten.
async fn read_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.service.read_file(&key).await.map_err(to_error)?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for_key(&key)),
            (header::CACHE_CONTROL, CACHE_FOREVER),
        ],
        data,
    ))
}
