//! REST endpoints for creating and controlling relay tasks.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use super::model::{CreateTaskRequest, CreateTaskResponse, SessionResponse};
use crate::error::TaskError;
use crate::tasks::{Controller, OwnerId, TaskId};

/// Header carrying the caller's session token.
pub const SESSION_HEADER: &str = "x-session-token";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct ApiState {
    pub controller: Arc<Controller>,
    /// Interval used when a create request omits or garbles it.
    pub default_interval_secs: u64,
}

/// Build the Axum router with the relay REST routes.
pub fn relay_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(new_session))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", get(task_detail))
        .route("/api/tasks/{id}/pause", post(pause_task))
        .route("/api/tasks/{id}/resume", post(resume_task))
        .route("/api/tasks/{id}/stop", post(stop_task))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Owner identity taken from the session header.
pub struct Owner(pub OwnerId);

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Owner(OwnerId::new(token)))
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"error": "Missing session token"})),
                )
                    .into_response()
            })
    }
}

fn task_error(err: TaskError) -> Response {
    let status = match err {
        TaskError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        TaskError::NotFound { .. } => StatusCode::NOT_FOUND,
    };
    (status, Json(serde_json::json!({"error": err.to_string()}))).into_response()
}

fn parse_id(raw: &str) -> Result<TaskId, TaskError> {
    raw.parse().map_err(|_| TaskError::not_found(raw))
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "convo-relay"
    }))
}

// ── Sessions ────────────────────────────────────────────────────────────

async fn new_session() -> impl IntoResponse {
    let token = format!("{:032x}", rand::random::<u128>());
    debug!("Issued session token");
    (StatusCode::CREATED, Json(SessionResponse { token }))
}

// ── Tasks ───────────────────────────────────────────────────────────────

async fn create_task(
    State(state): State<ApiState>,
    Owner(owner): Owner,
    Json(body): Json<CreateTaskRequest>,
) -> Response {
    let config = body.to_config(state.default_interval_secs);
    match state.controller.create(&owner, config).await {
        Ok(id) => {
            info!(task_id = %id, "Task created via API");
            (StatusCode::CREATED, Json(CreateTaskResponse { id })).into_response()
        }
        Err(TaskError::Validation { field }) => {
            debug!(field, "Rejected task configuration");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "error": format!("{field} is required"),
                    "field": field,
                    "config": body,
                })),
            )
                .into_response()
        }
        Err(e) => task_error(e),
    }
}

async fn list_tasks(State(state): State<ApiState>, Owner(owner): Owner) -> impl IntoResponse {
    Json(state.controller.list(&owner).await)
}

async fn task_detail(
    State(state): State<ApiState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Response {
    let result = match parse_id(&id) {
        Ok(id) => state.controller.inspect(&owner, id).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => task_error(e),
    }
}

#[derive(Clone, Copy)]
enum Control {
    Pause,
    Resume,
    Stop,
}

async fn apply_control(
    state: &ApiState,
    owner: &OwnerId,
    raw_id: &str,
    action: Control,
) -> Response {
    let id = match parse_id(raw_id) {
        Ok(id) => id,
        Err(e) => return task_error(e),
    };
    let controller = &state.controller;
    let applied = match action {
        Control::Pause => controller.pause(owner, id).await,
        Control::Resume => controller.resume(owner, id).await,
        Control::Stop => controller.stop(owner, id).await,
    };
    match applied {
        Ok(()) => match controller.inspect(owner, id).await {
            Ok(snapshot) => Json(snapshot).into_response(),
            Err(e) => task_error(e),
        },
        Err(e) => task_error(e),
    }
}

async fn pause_task(
    State(state): State<ApiState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Response {
    apply_control(&state, &owner, &id, Control::Pause).await
}

async fn resume_task(
    State(state): State<ApiState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Response {
    apply_control(&state, &owner, &id, Control::Resume).await
}

async fn stop_task(
    State(state): State<ApiState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Response {
    apply_control(&state, &owner, &id, Control::Stop).await
}
