pub mod attachments;
pub mod files;
pub mod health;
pub mod sections;
pub mod stats;
pub mod tasks;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{http::StatusCode, middleware, Json, Router};
use mytodo_service::{ServiceError, TodoService};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::auth::{auth_middleware, AuthConfig};

pub struct InnerAppState {
    pub service: Arc<dyn TodoService>,
    pub auth: Option<Arc<AuthConfig>>,
}

pub type AppState = Arc<InnerAppState>;

/// Error half of every handler's result: a status and `{"error": ...}`.
pub type ApiError = (StatusCode, Json<Value>);

pub fn build_router(service: Arc<dyn TodoService>, auth: Option<Arc<AuthConfig>>) -> Router {
    let state = Arc::new(InnerAppState { service, auth });

    let public = Router::new().merge(health::routes());

    let protected = Router::new()
        .merge(sections::routes())
        .merge(tasks::routes())
        .merge(attachments::routes())
        .merge(files::routes())
        .merge(stats::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub(crate) fn error_body(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": msg.into() })))
}

pub(crate) fn to_error(e: ServiceError) -> ApiError {
    match e {
        ServiceError::NotFound(msg) => error_body(StatusCode::NOT_FOUND, msg),
        ServiceError::InvalidInput(msg) => error_body(StatusCode::BAD_REQUEST, msg),
        ServiceError::Internal(msg) => {
            error!(error = %msg, "request failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, msg)
        }
    }
}

/// Malformed or unknown-field JSON bodies are a 400, not axum's 422.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| error_body(StatusCode::BAD_REQUEST, rejection.body_text()))
}
