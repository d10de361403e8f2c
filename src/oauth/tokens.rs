//! Token storage for the OAuth Client Registry (spec.md §4.7, §6): tracks
//! issued tokens per client so a revoke/rotation can invalidate them, and
//! supports the paginated listing spec.md §6 describes (`page_size=100`).

use crate::models::OauthToken;
use std::collections::HashMap;
use tokio::sync::RwLock;

pub const PAGE_SIZE: usize = 100;

#[derive(Default)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, OauthToken>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn issue(&self, client_id: &str, token: String, expires_at: i64, refresh_token: Option<String>) {
        let mut guard = self.tokens.write().await;
        guard.insert(
            token.clone(),
            OauthToken {
                token,
                client_id: client_id.to_string(),
                expires_at,
                refresh_token,
            },
        );
    }

    pub async fn get(&self, token: &str) -> Option<OauthToken> {
        self.tokens.read().await.get(token).cloned()
    }

    pub async fn revoke_all_for_client(&self, client_id: &str) {
        let mut guard = self.tokens.write().await;
        guard.retain(|_, t| t.client_id != client_id);
    }

    /// List a page of tokens for `client_id`, ordered by expiry ascending,
    /// `page_size` entries per page (spec.md §6).
    pub async fn list_page(&self, client_id: &str, page: usize) -> Vec<OauthToken> {
        let guard = self.tokens.read().await;
        let mut matching: Vec<OauthToken> = guard.values().filter(|t| t.client_id == client_id).cloned().collect();
        matching.sort_by_key(|t| t.expires_at);
        matching
            .into_iter()
            .skip(page * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_page_orders_by_expiry_and_paginates() {
        let store = TokenStore::new();
        for i in 0..5 {
            store.issue("client-1", format!("tok-{i}"), 100 - i as i64, None).await;
        }
        let page = store.list_page("client-1", 0).await;
        assert_eq!(page.len(), 5);
        assert!(page.first().unwrap().expires_at < page.last().unwrap().expires_at);
    }
}
