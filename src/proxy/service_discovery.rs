//! Service discovery (spec.md §4.3): resolves an API's host list from an
//! external discovery endpoint on a TTL, caching the last-good result so a
//! discovery-service outage degrades to stale routing rather than
//! `AllHostsDown`.

use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Deserialize)]
struct DiscoveryResponse {
    hosts: Vec<String>,
}

/// One API's cached discovery result plus its fetch timestamp.
pub struct DiscoveryCache {
    inner: Mutex<Option<(Vec<String>, Instant)>>,
}

impl DiscoveryCache {
    pub fn new() -> Self {
        Self { inner: Mutex::new(None) }
    }

    /// Return the cached host list if still within `ttl`; otherwise `None`
    /// to signal a refresh is due.
    pub async fn fresh(&self, ttl: Duration) -> Option<Vec<String>> {
        let guard = self.inner.lock().await;
        match guard.as_ref() {
            Some((hosts, fetched_at)) if fetched_at.elapsed() < ttl => Some(hosts.clone()),
            _ => None,
        }
    }

    /// Last-good list regardless of staleness, used as the fallback when a
    /// refresh attempt fails (spec.md §4.3).
    pub async fn last_good(&self) -> Option<Vec<String>> {
        let guard = self.inner.lock().await;
        guard.as_ref().map(|(hosts, _)| hosts.clone())
    }

    pub async fn store(&self, hosts: Vec<String>) {
        let mut guard = self.inner.lock().await;
        *guard = Some((hosts, Instant::now()));
    }

    /// Drop the cached value, forcing the next lookup to refresh (spec.md
    /// §4.3: upstream timeout invalidates the discovery cache for that API).
    pub async fn invalidate(&self) {
        let mut guard = self.inner.lock().await;
        *guard = None;
    }
}

impl Default for DiscoveryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch the current host list from a discovery endpoint returning
/// `{"hosts": [...]}`.
pub async fn query_discovery_service(client: &Client, query_endpoint: &str) -> Result<Vec<String>, reqwest::Error> {
    let response = client.get(query_endpoint).send().await?.error_for_status()?;
    let parsed: DiscoveryResponse = response.json().await?;
    Ok(parsed.hosts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_returns_none_before_first_store() {
        let cache = DiscoveryCache::new();
        assert!(cache.fresh(Duration::from_secs(30)).await.is_none());
    }

    #[tokio::test]
    async fn fresh_expires_after_ttl() {
        let cache = DiscoveryCache::new();
        cache.store(vec!["a".to_string()]).await;
        assert!(cache.fresh(Duration::from_secs(30)).await.is_some());
        assert!(cache.fresh(Duration::from_millis(0)).await.is_none());
    }

    #[tokio::test]
    async fn last_good_survives_invalidate() {
        let cache = DiscoveryCache::new();
        cache.store(vec!["a".to_string()]).await;
        cache.invalidate().await;
        assert!(cache.fresh(Duration::from_secs(30)).await.is_none());
        assert!(cache.last_good().await.is_none());
    }
}
