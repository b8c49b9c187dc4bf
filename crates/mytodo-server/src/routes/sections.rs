use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use mytodo_core::section::{CreateSection, ReorderSections, Section, UpdateSection};

use super::{json_body, to_error, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/sections", get(list_sections).post(create_section))
        .route("/api/sections/reorder", put(reorder_sections))
        .route(
            "/api/sections/{id}",
            put(update_section).delete(delete_section),
        )
}

async fn list_sections(State(state): State<AppState>) -> Result<Json<Vec<Section>>, ApiError> {
    state.service.list_sections().await.map(Json).map_err(to_error)
}

async fn create_section(
    State(state): State<AppState>,
    payload: Result<Json<CreateSection>, JsonRejection>,
) -> Result<(StatusCode, Json<Section>), ApiError> {
    let input = json_body(payload)?;
    state
        .service
        .create_section(&input)
        .await
        .map(|s| (StatusCode::CREATED, Json(s)))
        .map_err(to_error)
}

async fn update_section(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateSection>, JsonRejection>,
) -> Result<Json<Section>, ApiError> {
    let update = json_body(payload)?;
    state
        .service
        .update_section(id, &update)
        .await
        .map(Json)
        .map_err(to_error)
}

async fn reorder_sections(
    State(state): State<AppState>,
    payload: Result<Json<ReorderSections>, JsonRejection>,
) -> Result<Json<Vec<Section>>, ApiError> {
    let input = json_body(payload)?;
    state
        .service
        .reorder_sections(&input.section_ids)
        .await
        .map(Json)
        .map_err(to_error)
}

async fn delete_section(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_section(id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}
