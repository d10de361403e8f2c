//! Key (Session) CRUD (spec.md §4.5, §6): `{key, status, action}` response
//! shape, policy application on create/update, and master-key handling.

use super::AppState;
use crate::errors::{GatewayError, GatewayResult};
use crate::models::{Policy, Session};
use crate::models::policy::apply_policies;
use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize)]
pub struct KeyResponse {
    key: String,
    status: &'static str,
    action: &'static str,
}

#[derive(Deserialize)]
pub struct CreateKeyRequest {
    #[serde(flatten)]
    pub session: Session,
    #[serde(default)]
    pub suppress_reset: bool,
}

async fn resolve_policies(state: &AppState, session: &Session) -> GatewayResult<Vec<Policy>> {
    let guard = state.policies.read().await;
    session
        .apply_policies
        .iter()
        .map(|id| guard.get(id).cloned().ok_or_else(|| GatewayError::not_found("policy", id.clone())))
        .collect()
}

async fn guard_master_key(state: &AppState, session: &Session) -> GatewayResult<()> {
    if session.is_master_key_candidate() && !state.config.session.allow_master_keys {
        return Err(GatewayError::validation("master keys are disabled (AllowMasterKeys=false)"));
    }
    Ok(())
}

/// Whether a newly-created session's quota should be reset, per spec.md
/// §4.5: reset unless every API the session has access to sets
/// `DontSetQuotasOnCreate`.
async fn should_reset_quota_on_create(state: &AppState, session: &Session) -> bool {
    if session.access_rights.is_empty() {
        return true;
    }
    for api_id in session.access_rights.keys() {
        match state.registry.get(api_id).await {
            Some(spec) if spec.definition.dont_set_quotas_on_create => continue,
            _ => return true,
        }
    }
    false
}

/// Resolve whether `set()` should reset quota counters, per spec.md §4.5's
/// route table: `suppress_reset=1` always preserves them; otherwise a
/// brand-new key additionally honors `DontSetQuotasOnCreate`; an update to
/// an existing key always resets.
async fn resolve_reset_quota(state: &AppState, session: &Session, suppress_reset: bool, key_is_new: bool) -> bool {
    if suppress_reset {
        return false;
    }
    if key_is_new {
        return should_reset_quota_on_create(state, session).await;
    }
    true
}

pub async fn create(State(state): State<AppState>, Json(mut req): Json<CreateKeyRequest>) -> GatewayResult<Json<KeyResponse>> {
    if req.session.key_id.is_empty() {
        req.session.key_id = Uuid::new_v4().simple().to_string();
    }
    guard_master_key(&state, &req.session).await?;

    let policies = resolve_policies(&state, &req.session).await?;
    apply_policies(&mut req.session, &policies, true);

    let reset_quota = should_reset_quota_on_create(&state, &req.session).await;
    state.sessions.set(req.session.clone(), reset_quota).await?;
    Ok(Json(KeyResponse {
        key: req.session.key_id,
        status: "ok",
        action: "added",
    }))
}

pub async fn get(State(state): State<AppState>, Path(key_id): Path<String>) -> GatewayResult<Json<Session>> {
    let lookup_id = if state.config.session.hash_keys {
        crate::utils::hashing::hash_key(&key_id, state.config.session.hash_key_function)
    } else {
        key_id.clone()
    };
    state
        .sessions
        .get(&lookup_id)
        .await?
        .map(Json)
        .ok_or_else(|| GatewayError::not_found("key", key_id))
}

pub async fn update(
    State(state): State<AppState>,
    Path(key_id): Path<String>,
    Json(mut req): Json<CreateKeyRequest>,
) -> GatewayResult<Json<KeyResponse>> {
    let existing = state.sessions.get(&key_id).await?;
    req.session.key_id = key_id.clone();
    guard_master_key(&state, &req.session).await?;

    let key_is_new = existing.is_none();
    let policies = resolve_policies(&state, &req.session).await?;
    apply_policies(&mut req.session, &policies, key_is_new);

    let reset_quota = resolve_reset_quota(&state, &req.session, req.suppress_reset, key_is_new).await;
    state.sessions.set(req.session, reset_quota).await?;
    Ok(Json(KeyResponse {
        key: key_id,
        status: "ok",
        action: "modified",
    }))
}

pub async fn delete(State(state): State<AppState>, Path(key_id): Path<String>) -> GatewayResult<Json<KeyResponse>> {
    if !state.sessions.delete(&key_id).await? {
        return Err(GatewayError::not_found("key", key_id));
    }
    Ok(Json(KeyResponse {
        key: key_id,
        status: "ok",
        action: "deleted",
    }))
}

/// Preview how a policy set would resolve onto a session, without
/// persisting anything (spec.md §4.5).
pub async fn preview(State(state): State<AppState>, Json(mut req): Json<CreateKeyRequest>) -> GatewayResult<Json<Session>> {
    let policies = resolve_policies(&state, &req.session).await?;
    apply_policies(&mut req.session, &policies, true);
    Ok(Json(req.session))
}
