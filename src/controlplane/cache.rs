//! Cache invalidation (spec.md §4.5): drops an API's cached transport and
//! discovery state without a full reload, so the next request rebinds from
//! scratch.

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

pub async fn invalidate(State(state): State<AppState>, Path(api_id): Path<String>) -> GatewayResult<Json<StatusMessage>> {
    let spec = state
        .registry
        .get(&api_id)
        .await
        .ok_or_else(|| GatewayError::not_found("api", api_id.clone()))?;

    let mut mutable = spec.mutable.write().await;
    mutable.transport = None;
    mutable.last_good_host_list.clear();
    mutable.service_discovery_in_progress = false;

    Ok(Json(StatusMessage {
        status: "ok",
        message: format!("cache invalidated for {api_id}"),
    }))
}
