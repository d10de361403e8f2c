//! Org-scoped key listing and deletion (spec.md §4.5).

use super::AppState;
use crate::errors::{GatewayError, GatewayResult};
use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

#[derive(Serialize)]
pub struct StatusMessage {
    status: &'static str,
    message: String,
}

pub async fn list(State(state): State<AppState>, Path(org_id): Path<String>) -> GatewayResult<Json<Vec<String>>> {
    Ok(Json(state.sessions.list_by_org(&org_id).await?))
}

pub async fn delete_for_org(
    State(state): State<AppState>,
    Path((org_id, key_id)): Path<(String, String)>,
) -> GatewayResult<Json<StatusMessage>> {
    let session = state
        .sessions
        .get(&key_id)
        .await?
        .ok_or_else(|| GatewayError::not_found("key", key_id.clone()))?;

    if session.org_id != org_id {
        return Err(GatewayError::not_found("key", key_id));
    }

    state.sessions.delete(&key_id).await?;
    Ok(Json(StatusMessage {
        status: "ok",
        message: key_id,
    }))
}
