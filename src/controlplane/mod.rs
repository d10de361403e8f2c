//! Control-plane: the admin HTTP surface for API definitions, keys,
//! policies, and OAuth clients (spec.md §4.5, §6). Routes are assembled the
//! way the teacher's `web::mod` composes its `axum::Router`, with shared
//! state passed through `State` rather than globals.

pub mod apis;
pub mod cache;
pub mod health;
pub mod keys;
pub mod oauth_handlers;
pub mod org_keys;
pub mod policies;
pub mod reload;

use crate::config::Config;
use crate::models::Policy;
use crate::notifications::NotificationBus;
use crate::oauth::OauthClientRegistry;
use crate::registry::ApiSpecRegistry;
use crate::reload::ReloadCoordinator;
use crate::session::SessionStore;
use axum::Router;
use axum::routing::{delete, get, post, put};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared state every control-plane handler closes over.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ApiSpecRegistry>,
    pub sessions: Arc<dyn SessionStore>,
    pub policies: Arc<RwLock<HashMap<String, Policy>>>,
    pub oauth: Arc<OauthClientRegistry>,
    pub reload: Arc<ReloadCoordinator>,
    pub notifications: NotificationBus,
}

/// Build the admin router (spec.md §4.5's route table; §6 for request/
/// response shapes).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tyk/apis", get(apis::list).post(apis::create))
        .route("/tyk/apis/:api_id", get(apis::get).put(apis::update).delete(apis::delete))
        .route("/tyk/apis/:api_id/export", get(apis::export))
        .route("/tyk/apis/oas", post(apis::create_oas))
        .route(
            "/tyk/apis/oas/:api_id",
            get(apis::get_oas).put(apis::update_oas).delete(apis::delete),
        )
        .route("/tyk/apis/oas/:api_id/servers", put(apis::set_gateway_server_url))
        .route("/tyk/keys", post(keys::create))
        .route("/tyk/keys/preview", post(keys::preview))
        .route("/tyk/keys/:key_id", get(keys::get).put(keys::update).delete(keys::delete))
        .route("/tyk/org/keys/:org_id", get(org_keys::list))
        .route("/tyk/org/keys/:org_id/:key_id", delete(org_keys::delete_for_org))
        .route("/tyk/policies", get(policies::list).post(policies::create))
        .route(
            "/tyk/policies/:policy_id",
            get(policies::get).put(policies::update).delete(policies::delete),
        )
        .route(
            "/tyk/apis/:api_id/oauth/clients",
            get(oauth_handlers::list_clients).post(oauth_handlers::set_client),
        )
        .route(
            "/tyk/apis/:api_id/oauth/clients/:client_id",
            get(oauth_handlers::get_client).delete(oauth_handlers::revoke_client),
        )
        .route(
            "/tyk/apis/:api_id/oauth/clients/:client_id/tokens",
            get(oauth_handlers::list_tokens).delete(oauth_handlers::purge_tokens),
        )
        .route("/tyk/reload", get(reload::reload_now))
        .route("/tyk/reload/group", get(reload::group_reload))
        .route("/tyk/cache/invalidate/:api_id", delete(cache::invalidate))
        .route("/hello", get(health::health))
        .with_state(state)
}
