//! Policy CRUD (spec.md §4.5, §6).

use super::AppState;
use crate::errors::{GatewayError, GatewayResult};
use crate::models::Policy;
use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

#[derive(Serialize)]
pub struct StatusMessage {
    status: &'static str,
    message: String,
}

pub async fn list(State(state): State<AppState>) -> Json<Vec<Policy>> {
    let guard = state.policies.read().await;
    Json(guard.values().cloned().collect())
}

pub async fn get(State(state): State<AppState>, Path(policy_id): Path<String>) -> GatewayResult<Json<Policy>> {
    let guard = state.policies.read().await;
    guard
        .get(&policy_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| GatewayError::not_found("policy", policy_id))
}

pub async fn create(State(state): State<AppState>, Json(policy): Json<Policy>) -> GatewayResult<Json<StatusMessage>> {
    if policy.id.is_empty() {
        return Err(GatewayError::validation("policy id must not be empty"));
    }
    let mut guard = state.policies.write().await;
    if guard.contains_key(&policy.id) {
        return Err(GatewayError::Conflict(format!("policy '{}' already exists", policy.id)));
    }
    let id = policy.id.clone();
    guard.insert(id.clone(), policy);
    Ok(Json(StatusMessage {
        status: "ok",
        message: id,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(policy_id): Path<String>,
    Json(mut policy): Json<Policy>,
) -> GatewayResult<Json<StatusMessage>> {
    let mut guard = state.policies.write().await;
    if !guard.contains_key(&policy_id) {
        return Err(GatewayError::not_found("policy", policy_id));
    }
    policy.id = policy_id.clone();
    guard.insert(policy_id.clone(), policy);
    let id = policy_id;
    Ok(Json(StatusMessage {
        status: "ok",
        message: id,
    }))
}

pub async fn delete(State(state): State<AppState>, Path(policy_id): Path<String>) -> GatewayResult<Json<StatusMessage>> {
    let mut guard = state.policies.write().await;
    guard
        .remove(&policy_id)
        .ok_or_else(|| GatewayError::not_found("policy", policy_id.clone()))?;
    Ok(Json(StatusMessage {
        status: "ok",
        message: policy_id,
    }))
}
