//! API Spec Registry (spec.md §4.1): a hot-swappable, concurrently readable
//! catalog of `APISpec`s keyed by API ID.
//!
//! Single writer (the Reload Coordinator), many concurrent readers (the
//! proxy). Readers take a shared read lock on the registry map for the
//! lookup, then — only if they need to touch the transport handle or its
//! creation timestamp, the only per-request-mutable `APISpec` fields — a
//! per-spec lock. This is the sole mutation allowed between full reloads.

pub mod path_rules;
pub mod version_graph;

use crate::models::{ApiDefinition, OasDocument};
use crate::proxy::transport::CachedTransport;
use path_rules::CompiledRule;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mutable fields that may change between full reloads: the cached
/// transport handle and its creation timestamp, plus service-discovery
/// bookkeeping (spec.md §3, §5).
#[derive(Default)]
pub struct ApiSpecMutable {
    pub transport: Option<Arc<CachedTransport>>,
    pub last_good_host_list: Vec<String>,
    pub service_discovery_in_progress: bool,
    pub round_robin_cursor: usize,
}

/// The registry's live entry for one API: the definition plus precomputed
/// match tables and the handful of fields the proxy is allowed to mutate
/// in place (spec.md §3).
pub struct ApiSpec {
    pub definition: ApiDefinition,
    pub oas: Option<OasDocument>,
    /// version name -> compiled extended-path rules.
    pub match_tables: HashMap<String, Vec<CompiledRule>>,
    pub mutable: RwLock<ApiSpecMutable>,
}

impl ApiSpec {
    pub fn new(definition: ApiDefinition, oas: Option<OasDocument>) -> Self {
        let match_tables = definition
            .extended_paths
            .iter()
            .map(|(version, paths)| (version.clone(), path_rules::compile(&paths.rules)))
            .collect();

        Self {
            definition,
            oas,
            match_tables,
            mutable: RwLock::new(ApiSpecMutable {
                last_good_host_list: Vec::new(),
                ..Default::default()
            }),
        }
    }

    pub fn api_id(&self) -> &str {
        &self.definition.api_id
    }
}

type Snapshot = Arc<HashMap<String, Arc<ApiSpec>>>;

/// The concurrently-read registry. Modeled as an immutable snapshot pointer
/// with copy-on-write reloads (spec.md §9): readers clone the `Arc` under a
/// brief read lock and then operate lock-free against that snapshot, so a
/// reload in progress never produces a torn read.
pub struct ApiSpecRegistry {
    inner: RwLock<Snapshot>,
}

impl ApiSpecRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    pub async fn get(&self, api_id: &str) -> Option<Arc<ApiSpec>> {
        let snapshot = self.inner.read().await;
        snapshot.get(api_id).cloned()
    }

    pub async fn list_by_org(&self, org_id: &str) -> Vec<String> {
        let snapshot = self.inner.read().await;
        snapshot
            .values()
            .filter(|spec| spec.definition.org_id == org_id)
            .map(|spec| spec.definition.api_id.clone())
            .collect()
    }

    pub async fn snapshot(&self) -> Vec<Arc<ApiSpec>> {
        let snapshot = self.inner.read().await;
        snapshot.values().cloned().collect()
    }

    /// Atomically swap in a freshly rebuilt set of specs. Only the Reload
    /// Coordinator calls this (spec.md §4.1).
    pub async fn swap(&self, new_set: HashMap<String, Arc<ApiSpec>>) {
        let mut guard = self.inner.write().await;
        *guard = Arc::new(new_set);
    }

    /// Find the base API (if any) that currently lists `child_api_id`.
    pub async fn find_base_for_child(&self, child_api_id: &str) -> Option<Arc<ApiSpec>> {
        let snapshot = self.inner.read().await;
        snapshot
            .values()
            .find(|spec| {
                spec.definition
                    .version_definition
                    .versions
                    .values()
                    .any(|id| id == child_api_id)
            })
            .cloned()
    }
}

impl Default for ApiSpecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::api_definition::VersionDefinition;
    use std::collections::HashMap as Map;

    fn def(id: &str) -> ApiDefinition {
        ApiDefinition {
            api_id: id.to_string(),
            org_id: "org1".to_string(),
            name: id.to_string(),
            listen_path: "/".to_string(),
            strip_listen_path: false,
            target_url: "http://upstream".to_string(),
            host_list: Vec::new(),
            protocol: crate::models::Protocol::Http,
            tls: Default::default(),
            service_discovery: Default::default(),
            enable_load_balancing: false,
            preserve_host_header: false,
            disable_strip_slash: false,
            extended_paths: Map::new(),
            auth: Default::default(),
            use_oauth2: false,
            is_oas: false,
            enabled: true,
            version_definition: VersionDefinition::default(),
            dont_set_quotas_on_create: false,
        }
    }

    #[tokio::test]
    async fn swap_is_visible_to_new_readers_atomically() {
        let registry = ApiSpecRegistry::new();
        assert!(registry.get("api-1").await.is_none());

        let mut set = HashMap::new();
        set.insert("api-1".to_string(), Arc::new(ApiSpec::new(def("api-1"), None)));
        registry.swap(set).await;

        assert!(registry.get("api-1").await.is_some());
        assert!(registry.get("api-2").await.is_none());
    }

    #[tokio::test]
    async fn find_base_for_child_respects_version_map() {
        let registry = ApiSpecRegistry::new();
        let mut base = def("base-1");
        base.version_definition = VersionDefinition {
            name: "base".to_string(),
            location: None,
            key: String::new(),
            default: "v2".to_string(),
            versions: Map::from([("v2".to_string(), "child-1".to_string())]),
            base_id: None,
        };

        let mut set = HashMap::new();
        set.insert("base-1".to_string(), Arc::new(ApiSpec::new(base, None)));
        registry.swap(set).await;

        let found = registry.find_base_for_child("child-1").await;
        assert_eq!(found.unwrap().api_id(), "base-1");
        assert!(registry.find_base_for_child("child-2").await.is_none());
    }
}
