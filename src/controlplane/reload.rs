//! Reload endpoints (spec.md §4.5): `?block=true` waits for the rebuilt
//! registry to be live before responding.

use super::AppState;
use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ReloadParams {
    #[serde(default)]
    block: bool,
}

#[derive(Serialize)]
pub struct StatusMessage {
    status: &'static str,
}

pub async fn reload_now(State(state): State<AppState>, Query(params): Query<ReloadParams>) -> Json<StatusMessage> {
    state.reload.request_reload(params.block).await;
    Json(StatusMessage { status: "ok" })
}

pub async fn group_reload(State(state): State<AppState>, Query(params): Query<ReloadParams>) -> Json<StatusMessage> {
    state.reload.group_reload(params.block).await;
    Json(StatusMessage { status: "ok" })
}
