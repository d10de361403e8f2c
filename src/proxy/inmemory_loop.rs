//! In-memory loop detection (spec.md §4.2 step 7, §9): when an API's target
//! host resolves back to this same process (a gateway chaining to itself),
//! route the request through an in-process channel instead of dialing out,
//! and evict idle entries so the table doesn't grow unbounded.

use axum::body::Body;
use futures::future::BoxFuture;
use http::{Request, Response};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const IDLE_EVICTION: Duration = Duration::from_secs(60);
const SCAN_INTERVAL: Duration = Duration::from_secs(300);

pub type LoopHandler = Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, Response<Body>> + Send + Sync>;

struct Entry {
    handler: LoopHandler,
    last_used: Instant,
}

/// Registry of hosts this process is itself listening on, keyed by host
/// string (e.g. `localhost:8080`), so the Director can short-circuit a
/// self-referential proxy chain.
pub struct InMemoryLoopRegistry {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryLoopRegistry {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    pub async fn register(&self, host: String, handler: LoopHandler) {
        let mut guard = self.entries.lock().await;
        guard.insert(
            host,
            Entry {
                handler,
                last_used: Instant::now(),
            },
        );
    }

    pub async fn lookup(&self, host: &str) -> Option<LoopHandler> {
        let mut guard = self.entries.lock().await;
        let entry = guard.get_mut(host)?;
        entry.last_used = Instant::now();
        Some(entry.handler.clone())
    }

    /// Drop entries unused for longer than `IDLE_EVICTION`. Intended to run
    /// on a `SCAN_INTERVAL` tick from the reload coordinator's loop.
    pub async fn evict_idle(&self) {
        let mut guard = self.entries.lock().await;
        guard.retain(|_, entry| entry.last_used.elapsed() < IDLE_EVICTION);
    }

    pub fn scan_interval() -> Duration {
        SCAN_INTERVAL
    }
}

impl Default for InMemoryLoopRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_returns_none_for_unregistered_host() {
        let registry = InMemoryLoopRegistry::new();
        assert!(registry.lookup("localhost:8080").await.is_none());
    }

    #[tokio::test]
    async fn evict_idle_removes_stale_entries() {
        let registry = InMemoryLoopRegistry::new();
        let handler: LoopHandler = Arc::new(|_req| Box::pin(async { Response::new(Body::empty()) }));
        registry.register("localhost:8080".to_string(), handler).await;
        {
            let mut guard = registry.entries.lock().await;
            guard.get_mut("localhost:8080").unwrap().last_used = Instant::now() - Duration::from_secs(120);
        }
        registry.evict_idle().await;
        assert!(registry.lookup("localhost:8080").await.is_none());
    }
}
