use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::dto::{RecordSetRequest, StartSessionRequest};
use fitsync::error::SyncError;
use fitsync::session::OfflineWorkoutSession;
use fitsync::types::{SetEntry, SyncQueueItem};

/// Start an offline workout session
#[utoipa::path(
    post,
    path = "/1/sessions",
    tag = "sessions",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Session started", body = OfflineWorkoutSession),
        (status = 400, description = "Missing user_id")
    )
)]
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<OfflineWorkoutSession>), SyncError> {
    let session = state
        .sessions
        .start(&req.user_id, &req.name, req.workout_plan_id)?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// List offline sessions, oldest first
#[utoipa::path(
    get,
    path = "/1/sessions",
    tag = "sessions",
    responses(
        (status = 200, description = "All cached sessions", body = Vec<OfflineWorkoutSession>)
    )
)]
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<OfflineWorkoutSession>> {
    Json(state.sessions.list())
}

#[utoipa::path(
    get,
    path = "/1/sessions/{id}",
    tag = "sessions",
    params(
        ("id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "The session", body = OfflineWorkoutSession),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OfflineWorkoutSession>, SyncError> {
    Ok(Json(state.sessions.get(&id)?))
}

/// Log a set; queued for sync at normal priority
#[utoipa::path(
    post,
    path = "/1/sessions/{id}/sets",
    tag = "sessions",
    params(
        ("id" = String, Path, description = "Session ID")
    ),
    request_body = SetEntry,
    responses(
        (status = 201, description = "Queued workout_session mutation", body = SyncQueueItem),
        (status = 400, description = "Invalid set or session already completed"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn record_set(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(set): Json<RecordSetRequest>,
) -> Result<(StatusCode, Json<SyncQueueItem>), SyncError> {
    let item = state.sessions.record_set(&id, set).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Finish a session; the completion is queued at high priority
#[utoipa::path(
    post,
    path = "/1/sessions/{id}/complete",
    tag = "sessions",
    params(
        ("id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Completed session", body = OfflineWorkoutSession),
        (status = 404, description = "Session not found")
    )
)]
pub async fn complete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OfflineWorkoutSession>, SyncError> {
    Ok(Json(state.sessions.complete(&id).await?))
}

/// Forget a session locally; already queued mutations stay queued
#[utoipa::path(
    delete,
    path = "/1/sessions/{id}",
    tag = "sessions",
    params(
        ("id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Removed session", body = OfflineWorkoutSession),
        (status = 404, description = "Session not found")
    )
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OfflineWorkoutSession>, SyncError> {
    Ok(Json(state.sessions.remove(&id)?))
}
