//! Classic and OAS API Definition CRUD (spec.md §4.5, §9): both schemas
//! live behind the same `/tyk/apis` surface, distinguished by `is_oas` and
//! the `/oas` sub-path, and a version-graph mutation on one side always
//! writes its paired base/child atomically.

use super::AppState;
use crate::errors::{GatewayError, GatewayResult};
use crate::models::{ApiDefinition, OasDocument};
use crate::registry::{ApiSpec, version_graph};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Serialize)]
pub struct StatusMessage {
    status: &'static str,
    message: String,
}

#[derive(Deserialize)]
pub struct ExportParams {
    #[serde(default)]
    pub mode: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> Json<Vec<ApiDefinition>> {
    let specs = state.registry.snapshot().await;
    Json(specs.into_iter().map(|s| s.definition.clone()).collect())
}

/// Fetch one API. If it is a version child still listed by its base, the
/// response carries `X-Tyk-Base-API-ID` (spec.md §4.1, §8 scenario 2).
pub async fn get(State(state): State<AppState>, Path(api_id): Path<String>) -> GatewayResult<impl IntoResponse> {
    let spec = state
        .registry
        .get(&api_id)
        .await
        .ok_or_else(|| GatewayError::not_found("api", api_id.clone()))?;

    let mut headers = HeaderMap::new();
    if let Some(base_spec) = state.registry.find_base_for_child(&api_id).await {
        if let Some(base_id) = version_graph::base_header_value(&base_spec.definition, &api_id) {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(version_graph::BASE_API_ID_HEADER),
                HeaderValue::from_str(&base_id),
            ) {
                headers.insert(name, value);
            }
        }
    }

    Ok((headers, Json(spec.definition.clone())))
}

/// Query parameters for `POST /apis` that attach the new definition as a
/// version child of an existing base (spec.md §4.1, §4.5, §8 scenario 2).
#[derive(Deserialize)]
pub struct CreateParams {
    pub base_api_id: Option<String>,
    pub new_version_name: Option<String>,
    #[serde(default)]
    pub set_default: bool,
    pub base_api_version_name: Option<String>,
}

/// Validate and insert a new Classic API definition. When `base_api_id` is
/// given, atomically rewrites the base's version map to list the new
/// definition under `new_version_name`, optionally making it the default,
/// and optionally renaming the base's own version (spec.md §4.1, §4.5's
/// validation rules, §8 scenario 2).
pub async fn create(
    State(state): State<AppState>,
    Query(params): Query<CreateParams>,
    Json(mut definition): Json<ApiDefinition>,
) -> GatewayResult<Json<StatusMessage>> {
    validate_definition(&definition)?;

    if state.registry.get(&definition.api_id).await.is_some() {
        return Err(GatewayError::Conflict(format!("api '{}' already exists", definition.api_id)));
    }

    let base = if let Some(base_api_id) = &params.base_api_id {
        let base_spec = state
            .registry
            .get(base_api_id)
            .await
            .ok_or_else(|| GatewayError::not_found("api", base_api_id.clone()))?;
        let version_name = params
            .new_version_name
            .clone()
            .ok_or_else(|| GatewayError::validation("new_version_name is required when base_api_id is set"))?;

        let mut base_def = base_spec.definition.clone();
        version_graph::add_child(&mut base_def, &version_name, &definition.api_id, params.set_default);
        if let Some(base_version_name) = &params.base_api_version_name {
            base_def.version_definition.name = base_version_name.clone();
        }
        definition.version_definition.base_id = Some(base_api_id.clone());

        Some(Arc::new(ApiSpec::new(base_def, base_spec.oas.clone())))
    } else {
        None
    };

    insert_definition(&state, definition.clone(), base).await?;
    state.reload.request_reload(false).await;
    Ok(Json(StatusMessage {
        status: "ok",
        message: definition.api_id,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(api_id): Path<String>,
    Json(mut definition): Json<ApiDefinition>,
) -> GatewayResult<Json<StatusMessage>> {
    validate_definition(&definition)?;
    if state.registry.get(&api_id).await.is_none() {
        return Err(GatewayError::not_found("api", api_id));
    }
    definition.api_id = api_id.clone();

    let base = state.registry.find_base_for_child(&api_id).await;
    insert_definition(&state, definition, base).await?;
    state.reload.request_reload(false).await;
    Ok(Json(StatusMessage {
        status: "ok",
        message: api_id,
    }))
}

/// Delete an API. If it is a version base, cascades `base_id` clears to its
/// children (spec.md §9 resolved open question).
pub async fn delete(State(state): State<AppState>, Path(api_id): Path<String>) -> GatewayResult<Json<StatusMessage>> {
    let spec = state
        .registry
        .get(&api_id)
        .await
        .ok_or_else(|| GatewayError::not_found("api", api_id.clone()))?;

    if spec.definition.is_base() {
        let child_ids: Vec<String> = spec.definition.version_definition.versions.values().cloned().collect();
        for child_id in &child_ids {
            if let Some(child_spec) = state.registry.get(child_id).await {
                let mut child_def = child_spec.definition.clone();
                version_graph::cascade_clear_base_id(&mut [&mut child_def], &api_id);
                insert_definition(&state, child_def, None).await?;
            }
        }
    }

    if let Some(base_spec) = state.registry.find_base_for_child(&api_id).await {
        let mut base_def = base_spec.definition.clone();
        version_graph::remove_child(&mut base_def, &api_id);
        insert_definition(&state, base_def, None).await?;
    }

    state.reload.request_reload(false).await;
    Ok(Json(StatusMessage {
        status: "ok",
        message: api_id,
    }))
}

pub async fn export(
    State(state): State<AppState>,
    Path(api_id): Path<String>,
    Query(params): Query<ExportParams>,
) -> GatewayResult<Json<Value>> {
    let spec = state
        .registry
        .get(&api_id)
        .await
        .ok_or_else(|| GatewayError::not_found("api", api_id))?;

    if let Some(oas) = &spec.oas {
        let value = if params.mode.as_deref() == Some("public") {
            oas.without_extension()
        } else {
            oas.raw.clone()
        };
        return Ok(Json(value));
    }

    serde_json::to_value(&spec.definition)
        .map(Json)
        .map_err(|e| GatewayError::internal(format!("export serialization failed: {e}")))
}

#[derive(Deserialize)]
pub struct OasCreateRequest {
    pub definition: ApiDefinition,
    pub oas: Value,
}

pub async fn create_oas(State(state): State<AppState>, Json(req): Json<OasCreateRequest>) -> GatewayResult<Json<StatusMessage>> {
    let mut definition = req.definition;
    definition.is_oas = true;
    validate_definition(&definition)?;

    if state.registry.get(&definition.api_id).await.is_some() {
        return Err(GatewayError::Conflict(format!("api '{}' already exists", definition.api_id)));
    }

    let oas = OasDocument::new(req.oas);
    insert_oas_definition(&state, definition.clone(), oas).await?;
    state.reload.request_reload(false).await;
    Ok(Json(StatusMessage {
        status: "ok",
        message: definition.api_id,
    }))
}

pub async fn get_oas(State(state): State<AppState>, Path(api_id): Path<String>) -> GatewayResult<Json<Value>> {
    let spec = state
        .registry
        .get(&api_id)
        .await
        .ok_or_else(|| GatewayError::not_found("api", api_id))?;
    let oas = spec.oas.as_ref().ok_or_else(|| GatewayError::validation("not an OAS API"))?;
    Ok(Json(oas.raw.clone()))
}

pub async fn update_oas(
    State(state): State<AppState>,
    Path(api_id): Path<String>,
    Json(raw): Json<Value>,
) -> GatewayResult<Json<StatusMessage>> {
    let spec = state
        .registry
        .get(&api_id)
        .await
        .ok_or_else(|| GatewayError::not_found("api", api_id.clone()))?;

    let mut oas = OasDocument::new(raw);
    let extension = oas.extension()?;
    let mut definition = spec.definition.clone();
    definition.name = extension.info.name.clone();
    definition.enabled = extension.info.state.active;
    definition.listen_path = extension.server.listen_path.value.clone();
    definition.strip_listen_path = extension.server.listen_path.strip;
    definition.target_url = extension.upstream.url.clone();

    oas.set_gateway_server_url(&definition.listen_path)?;
    insert_oas_definition(&state, definition, oas).await?;
    state.reload.request_reload(false).await;
    Ok(Json(StatusMessage {
        status: "ok",
        message: api_id,
    }))
}

/// Projects the vendor extension onto the Classic fields before persisting,
/// per spec.md §3/§9's "projects onto the Classic definition's fields".
pub async fn set_gateway_server_url(
    State(state): State<AppState>,
    Path(api_id): Path<String>,
    Json(gateway_url): Json<String>,
) -> GatewayResult<Json<StatusMessage>> {
    let spec = state
        .registry
        .get(&api_id)
        .await
        .ok_or_else(|| GatewayError::not_found("api", api_id.clone()))?;
    let mut oas = spec
        .oas
        .clone()
        .ok_or_else(|| GatewayError::validation("not an OAS API"))?;
    oas.set_gateway_server_url(&gateway_url)?;
    insert_oas_definition(&state, spec.definition.clone(), oas).await?;
    state.reload.request_reload(false).await;
    Ok(Json(StatusMessage {
        status: "ok",
        message: api_id,
    }))
}

fn validate_definition(definition: &ApiDefinition) -> GatewayResult<()> {
    if definition.api_id.is_empty() {
        return Err(GatewayError::validation("api_id must not be empty"));
    }
    if !crate::utils::validation::is_valid_listen_path(&definition.listen_path) {
        return Err(GatewayError::validation("listen_path must start with '/' and contain no whitespace"));
    }
    if definition.target_url.is_empty() && definition.host_list.is_empty() {
        return Err(GatewayError::validation("target_url or host_list must be set"));
    }
    Ok(())
}

/// Write a definition (Classic or as part of an OAS update) into the
/// registry as a single-entry overlay on top of the current snapshot, and
/// — if `base` is given — write the base's updated version map alongside it
/// atomically (spec.md §4.1, §4.5).
async fn insert_definition(state: &AppState, definition: ApiDefinition, base: Option<Arc<ApiSpec>>) -> GatewayResult<()> {
    let mut snapshot: std::collections::HashMap<String, Arc<ApiSpec>> = state
        .registry
        .snapshot()
        .await
        .into_iter()
        .map(|spec| (spec.definition.api_id.clone(), spec))
        .collect();

    let oas = snapshot.get(&definition.api_id).and_then(|s| s.oas.clone());
    snapshot.insert(definition.api_id.clone(), Arc::new(ApiSpec::new(definition, oas)));

    if let Some(base_spec) = base {
        snapshot.insert(base_spec.definition.api_id.clone(), base_spec);
    }

    state.registry.swap(snapshot).await;
    Ok(())
}

async fn insert_oas_definition(state: &AppState, definition: ApiDefinition, oas: OasDocument) -> GatewayResult<()> {
    let mut snapshot: std::collections::HashMap<String, Arc<ApiSpec>> = state
        .registry
        .snapshot()
        .await
        .into_iter()
        .map(|spec| (spec.definition.api_id.clone(), spec))
        .collect();
    snapshot.insert(definition.api_id.clone(), Arc::new(ApiSpec::new(definition, Some(oas))));
    state.registry.swap(snapshot).await;
    Ok(())
}
