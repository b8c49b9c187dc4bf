use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use mytodo_core::task::{CreateTask, Task, UpdateTask};
use mytodo_core::view::View;
use serde::Deserialize;

use super::{error_body, json_body, to_error, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/restore", post(restore_task))
        .route("/api/tasks/{id}/reminded", post(mark_reminded))
}

#[derive(Debug, Deserialize)]
struct TaskQuery {
    view: Option<String>,
    section_id: Option<i64>,
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(q): Query<TaskQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let view = View::from_query(q.view.as_deref(), q.section_id)
        .map_err(|e| error_body(StatusCode::BAD_REQUEST, e.to_string()))?;
    state.service.list_tasks(&view).await.map(Json).map_err(to_error)
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    state.service.get_task(id).await.map(Json).map_err(to_error)
}

async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let input = json_body(payload)?;
    state
        .service
        .create_task(&input)
        .await
        .map(|t| (StatusCode::CREATED, Json(t)))
        .map_err(to_error)
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateTask>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let update = json_body(payload)?;
    state
        .service
        .update_task(id, &update)
        .await
        .map(Json)
        .map_err(to_error)
}

#[derive(Debug, Default, Deserialize)]
struct DeleteQuery {
    #[serde(default)]
    permanent: bool,
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(q): Query<DeleteQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_task(id, q.permanent)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

async fn restore_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    state.service.restore_task(id).await.map(Json).map_err(to_error)
}

async fn mark_reminded(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    state
        .service
        .mark_task_reminded(id)
        .await
        .map(Json)
        .map_err(to_error)
}
