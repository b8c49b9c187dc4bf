use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use mytodo_core::retention::PurgeReport;
use mytodo_core::stats::TaskStats;

use super::{to_error, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/stats", get(task_stats))
        .route("/api/cleanup", post(cleanup))
}

async fn task_stats(State(state): State<AppState>) -> Result<Json<TaskStats>, ApiError> {
    state.service.task_stats().await.map(Json).map_err(to_error)
}

async fn cleanup(State(state): State<AppState>) -> Result<Json<PurgeReport>, ApiError> {
    state.service.cleanup().await.map(Json).map_err(to_error)
}
