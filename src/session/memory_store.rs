//! In-memory reference `SessionStore` implementation: a process-local
//! session table with set-preserves-quota semantics (spec.md §4.5,
//! §8: "updating a key preserves its quota counters unless reset is
//! explicitly requested").

use super::SessionStore;
use crate::errors::GatewayResult;
use crate::models::Session;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key_id: &str) -> GatewayResult<Option<Session>> {
        Ok(self.sessions.read().await.get(key_id).cloned())
    }

    async fn set(&self, mut session: Session, reset_quota: bool) -> GatewayResult<()> {
        let mut guard = self.sessions.write().await;
        if !reset_quota {
            if let Some(existing) = guard.get(&session.key_id) {
                for (api_id, existing_def) in &existing.access_rights {
                    if let (Some(existing_limit), Some(new_def)) =
                        (&existing_def.limit, session.access_rights.get_mut(api_id))
                    {
                        if let Some(new_limit) = &mut new_def.limit {
                            new_limit.quota_remaining = existing_limit.quota_remaining;
                            new_limit.quota_renews = existing_limit.quota_renews;
                        }
                    }
                }
                session.last_updated = existing.last_updated;
            } else {
                session.last_updated = chrono::Utc::now();
            }
        } else {
            session.last_updated = chrono::Utc::now();
        }
        guard.insert(session.key_id.clone(), session);
        Ok(())
    }

    async fn delete(&self, key_id: &str) -> GatewayResult<bool> {
        Ok(self.sessions.write().await.remove(key_id).is_some())
    }

    async fn list_by_org(&self, org_id: &str) -> GatewayResult<Vec<String>> {
        let guard = self.sessions.read().await;
        Ok(guard
            .values()
            .filter(|s| s.org_id == org_id)
            .map(|s| s.key_id.clone())
            .collect())
    }

    async fn find_by_username(&self, org_id: &str, username: &str) -> GatewayResult<Option<Session>> {
        let guard = self.sessions.read().await;
        Ok(guard
            .values()
            .find(|s| {
                s.org_id == org_id
                    && s.metadata.get("username").and_then(|v| v.as_str()) == Some(username)
            })
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::{AccessDefinition, Limit};

    fn session_with_quota(key_id: &str, remaining: i64) -> Session {
        let mut session = Session::new(key_id, "org1");
        session.access_rights.insert(
            "api-1".to_string(),
            AccessDefinition {
                limit: Some(Limit {
                    quota_max: 1000,
                    quota_remaining: remaining,
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        session
    }

    #[tokio::test]
    async fn set_preserves_quota_unless_reset_requested() {
        let store = MemorySessionStore::new();
        store.set(session_with_quota("key1", 42), false).await.unwrap();

        let updated = session_with_quota("key1", 1000);
        store.set(updated, false).await.unwrap();

        let fetched = store.get("key1").await.unwrap().unwrap();
        let limit = fetched.access_rights["api-1"].limit.as_ref().unwrap();
        assert_eq!(limit.quota_remaining, 42);
    }

    #[tokio::test]
    async fn set_with_reset_quota_overwrites() {
        let store = MemorySessionStore::new();
        store.set(session_with_quota("key1", 42), false).await.unwrap();
        store.set(session_with_quota("key1", 1000), true).await.unwrap();

        let fetched = store.get("key1").await.unwrap().unwrap();
        let limit = fetched.access_rights["api-1"].limit.as_ref().unwrap();
        assert_eq!(limit.quota_remaining, 1000);
    }

    #[tokio::test]
    async fn set_preserves_last_updated_unless_reset_requested() {
        let store = MemorySessionStore::new();
        store.set(session_with_quota("key1", 42), false).await.unwrap();
        let first = store.get("key1").await.unwrap().unwrap().last_updated;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.set(session_with_quota("key1", 1000), false).await.unwrap();

        let second = store.get("key1").await.unwrap().unwrap().last_updated;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn delete_returns_false_for_missing_key() {
        let store = MemorySessionStore::new();
        assert!(!store.delete("missing").await.unwrap());
    }
}
