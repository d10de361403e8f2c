//! OAuth Client Registry (spec.md §4.7): per-API client storage, secret
//! rotation, and cascading token invalidation when a client's policy
//! changes.

pub mod tokens;

use crate::errors::{GatewayError, GatewayResult};
use crate::models::OauthClient;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokens::TokenStore;

/// Clients are stored per-API, keyed by client ID, the way spec.md §6
/// describes listing ("clients for api_id").
#[derive(Default)]
pub struct OauthClientRegistry {
    clients: RwLock<HashMap<String, HashMap<String, OauthClient>>>,
    tokens: TokenStore,
}

impl OauthClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self, api_id: &str) -> Vec<OauthClient> {
        self.clients
            .read()
            .await
            .get(api_id)
            .map(|clients| clients.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn get(&self, api_id: &str, client_id: &str) -> Option<OauthClient> {
        self.clients.read().await.get(api_id)?.get(client_id).cloned()
    }

    /// Create or replace a client. If the `policy_id` changes on an
    /// existing client, every token it has issued is invalidated (spec.md
    /// §4.7: a secret/policy rotation must not leave stale-privileged
    /// tokens alive).
    pub async fn set_client(&self, client: OauthClient) -> GatewayResult<()> {
        let mut guard = self.clients.write().await;
        let per_api = guard.entry(client.api_id.clone()).or_default();

        let policy_changed = per_api
            .get(&client.client_id)
            .map(|existing| existing.policy_id != client.policy_id)
            .unwrap_or(false);

        per_api.insert(client.client_id.clone(), client.clone());
        drop(guard);

        if policy_changed {
            self.tokens.revoke_all_for_client(&client.client_id).await;
        }
        Ok(())
    }

    pub async fn revoke(&self, api_id: &str, client_id: &str) -> GatewayResult<()> {
        let mut guard = self.clients.write().await;
        let per_api = guard
            .get_mut(api_id)
            .ok_or_else(|| GatewayError::not_found("api", api_id))?;
        per_api
            .remove(client_id)
            .ok_or_else(|| GatewayError::not_found("oauth client", client_id))?;
        drop(guard);
        self.tokens.revoke_all_for_client(client_id).await;
        Ok(())
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_id: &str, client_id: &str, policy_id: &str) -> OauthClient {
        OauthClient {
            client_id: client_id.to_string(),
            api_id: api_id.to_string(),
            secret: "secret".to_string(),
            secret_is_hashed: false,
            redirect_uri: "https://example.test/callback".to_string(),
            policy_id: policy_id.to_string(),
            description: String::new(),
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn policy_change_revokes_existing_tokens() {
        let registry = OauthClientRegistry::new();
        registry.set_client(client("api-1", "client-1", "policy-a")).await.unwrap();
        registry
            .tokens()
            .issue("client-1", "token-1".to_string(), 9_999_999_999, None)
            .await;

        registry.set_client(client("api-1", "client-1", "policy-b")).await.unwrap();

        assert!(registry.tokens().get("token-1").await.is_none());
    }

    #[tokio::test]
    async fn revoke_removes_client_and_tokens() {
        let registry = OauthClientRegistry::new();
        registry.set_client(client("api-1", "client-1", "policy-a")).await.unwrap();
        registry
            .tokens()
            .issue("client-1", "token-1".to_string(), 9_999_999_999, None)
            .await;

        registry.revoke("api-1", "client-1").await.unwrap();
        assert!(registry.get("api-1", "client-1").await.is_none());
        assert!(registry.tokens().get("token-1").await.is_none());
    }
}
