//! OAuth Client Registry HTTP surface (spec.md §4.7).

use super::AppState;
use crate::errors::GatewayResult;
use crate::models::OauthClient;
use crate::models::oauth_client::OauthToken;
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct StatusMessage {
    status: &'static str,
    message: String,
}

pub async fn list_clients(State(state): State<AppState>, Path(api_id): Path<String>) -> Json<Vec<OauthClient>> {
    Json(state.oauth.list(&api_id).await)
}

pub async fn get_client(
    State(state): State<AppState>,
    Path((api_id, client_id)): Path<(String, String)>,
) -> GatewayResult<Json<OauthClient>> {
    state
        .oauth
        .get(&api_id, &client_id)
        .await
        .map(Json)
        .ok_or_else(|| crate::errors::GatewayError::not_found("oauth client", client_id))
}

pub async fn set_client(
    State(state): State<AppState>,
    Path(api_id): Path<String>,
    Json(mut client): Json<OauthClient>,
) -> GatewayResult<Json<StatusMessage>> {
    client.api_id = api_id;
    state.oauth.set_client(client.clone()).await?;
    Ok(Json(StatusMessage {
        status: "ok",
        message: client.client_id,
    }))
}

pub async fn revoke_client(
    State(state): State<AppState>,
    Path((api_id, client_id)): Path<(String, String)>,
) -> GatewayResult<Json<StatusMessage>> {
    state.oauth.revoke(&api_id, &client_id).await?;
    Ok(Json(StatusMessage {
        status: "ok",
        message: client_id,
    }))
}

#[derive(Deserialize)]
pub struct PageParams {
    #[serde(default)]
    page: usize,
}

pub async fn list_tokens(
    State(state): State<AppState>,
    Path((_api_id, client_id)): Path<(String, String)>,
    Query(params): Query<PageParams>,
) -> Json<Vec<OauthToken>> {
    Json(state.oauth.tokens().list_page(&client_id, params.page).await)
}

pub async fn purge_tokens(
    State(state): State<AppState>,
    Path((_api_id, client_id)): Path<(String, String)>,
) -> Json<StatusMessage> {
    state.oauth.tokens().revoke_all_for_client(&client_id).await;
    Json(StatusMessage {
        status: "ok",
        message: client_id,
    })
}
