//! Session/Key Store Facade (spec.md §4.5, §6): persistence-agnostic access
//! to sessions, fronted by a trait so the control-plane handlers don't care
//! whether the backing store is in-memory, Redis, or a database — mirroring
//! the teacher's `repositories::traits::Repository<T, ID>` abstraction.

pub mod memory_store;

use crate::errors::GatewayResult;
use crate::models::Session;
use async_trait::async_trait;

/// Key prefix for quota counters, hashed the same way regardless of
/// backend (spec.md §6).
pub fn quota_key(key_id: &str) -> String {
    format!("quota-{key_id}")
}

/// Key prefix for rate-limit counters (spec.md §6).
pub fn rate_limit_key(key_id: &str, api_id: &str) -> String {
    format!("rate-limit-{api_id}-{key_id}")
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key_id: &str) -> GatewayResult<Option<Session>>;
    async fn set(&self, session: Session, reset_quota: bool) -> GatewayResult<()>;
    async fn delete(&self, key_id: &str) -> GatewayResult<bool>;
    async fn list_by_org(&self, org_id: &str) -> GatewayResult<Vec<String>>;
    async fn find_by_username(&self, org_id: &str, username: &str) -> GatewayResult<Option<Session>>;
}
