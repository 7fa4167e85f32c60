use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;
use crate::dto::{NetworkRequest, NetworkResponse};

/// Report a connectivity change
///
/// Going online triggers a drain from the background loop.
#[utoipa::path(
    post,
    path = "/1/network",
    tag = "sync",
    request_body = NetworkRequest,
    responses(
        (status = 200, description = "Status after the change", body = NetworkResponse)
    )
)]
pub async fn set_network(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NetworkRequest>,
) -> Json<NetworkResponse> {
    let changed = state.network.set_online(req.online);
    Json(NetworkResponse {
        changed,
        status: state.manager.status().await,
    })
}
