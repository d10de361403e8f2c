//! Reload Coordinator (spec.md §4.1, §5, §9): debounces reload requests,
//! rebuilds the `APISpecRegistry` from storage, swaps it in atomically, and
//! broadcasts a `GroupReload` notification. Modeled on the teacher's
//! `JobScheduler::run` — a `tokio::select!` loop driven by a ticking
//! interval plus a cancellation token — generalized from "evaluate cron
//! schedules" to "coalesce pending reload requests".

use crate::notifications::NotificationBus;
use crate::registry::ApiSpecRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Minimum spacing between consecutive rebuilds, so a burst of control-plane
/// writes collapses into a single reload (spec.md §5).
const DEBOUNCE: Duration = Duration::from_millis(500);

/// A pending reload request. `done` is notified once the swap completes, so
/// a caller that asked for `block=true` semantics can wait on it.
struct ReloadRequest {
    done: Arc<Notify>,
}

/// Function that rebuilds the full API spec set from persistent storage.
/// Supplied by the caller so the coordinator stays storage-agnostic, the
/// same separation the teacher draws between `JobScheduler` and its
/// repositories.
pub type RegistryLoader = Arc<dyn Fn() -> futures::future::BoxFuture<'static, anyhow::Result<std::collections::HashMap<String, Arc<crate::registry::ApiSpec>>>> + Send + Sync>;

pub struct ReloadCoordinator {
    registry: Arc<ApiSpecRegistry>,
    notifications: NotificationBus,
    loader: RegistryLoader,
    sender: mpsc::UnboundedSender<ReloadRequest>,
    receiver: tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<ReloadRequest>>>,
}

impl ReloadCoordinator {
    pub fn new(registry: Arc<ApiSpecRegistry>, notifications: NotificationBus, loader: RegistryLoader) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            registry,
            notifications,
            loader,
            sender,
            receiver: tokio::sync::Mutex::new(Some(receiver)),
        }
    }

    /// Queue a reload. If `block` is true, waits for the reload to actually
    /// complete before returning (spec.md §4.5's `?block=true` query param).
    pub async fn request_reload(&self, block: bool) {
        let done = Arc::new(Notify::new());
        let waiter = done.clone();
        if self.sender.send(ReloadRequest { done }).is_err() {
            warn!("reload coordinator loop is not running; request dropped");
            return;
        }
        if block {
            waiter.notified().await;
        }
    }

    /// Group reload: request a reload and broadcast `GroupReload` so peer
    /// gateways in the cluster also reload (spec.md §4.5).
    pub async fn group_reload(&self, block: bool) {
        self.request_reload(block).await;
        self.notifications
            .publish(crate::models::NotificationCommand::GroupReload, String::new());
    }

    /// Run the debounce loop until `cancellation_token` fires. Each tick,
    /// drains any requests that have accumulated, rebuilds once, and wakes
    /// every waiter — mirroring `JobScheduler::run`'s interval/select!
    /// shape but coalescing instead of re-evaluating schedules.
    pub async fn run(&self, cancellation_token: CancellationToken) {
        let mut receiver = self
            .receiver
            .lock()
            .await
            .take()
            .expect("ReloadCoordinator::run must only be called once");

        info!("reload coordinator started");
        let mut pending: Vec<ReloadRequest> = Vec::new();
        let mut debounce = tokio::time::interval(DEBOUNCE);
        debounce.tick().await;

        loop {
            tokio::select! {
                maybe_request = receiver.recv() => {
                    match maybe_request {
                        Some(request) => pending.push(request),
                        None => break,
                    }
                }
                _ = debounce.tick() => {
                    if pending.is_empty() {
                        continue;
                    }
                    let waiters = std::mem::take(&mut pending);
                    self.reload_once().await;
                    for waiter in waiters {
                        waiter.done.notify_one();
                    }
                }
                _ = cancellation_token.cancelled() => {
                    info!("reload coordinator received cancellation signal, shutting down");
                    break;
                }
            }
        }
        info!("reload coordinator stopped");
    }

    async fn reload_once(&self) {
        debug!("rebuilding api spec registry");
        match (self.loader)().await {
            Ok(new_set) => {
                self.registry.swap(new_set).await;
                info!("api spec registry reloaded");
            }
            Err(e) => warn!("registry reload failed, keeping previous snapshot: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApiDefinition;
    use crate::registry::ApiSpec;
    use std::collections::HashMap;

    fn sample_definition(id: &str) -> ApiDefinition {
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
            extended_paths: HashMap::new(),
            auth: Default::default(),
            use_oauth2: false,
            is_oas: false,
            enabled: true,
            version_definition: Default::default(),
            dont_set_quotas_on_create: false,
        }
    }

    #[tokio::test]
    async fn blocking_reload_waits_for_swap() {
        let registry = Arc::new(ApiSpecRegistry::new());
        let notifications = NotificationBus::new(b"secret".to_vec());
        let loader: RegistryLoader = Arc::new(|| {
            Box::pin(async {
                let mut set = HashMap::new();
                set.insert("api-1".to_string(), Arc::new(ApiSpec::new(sample_definition("api-1"), None)));
                Ok(set)
            })
        });

        let coordinator = Arc::new(ReloadCoordinator::new(registry.clone(), notifications, loader));
        let token = CancellationToken::new();

        let run_handle = {
            let coordinator = coordinator.clone();
            let token = token.clone();
            tokio::spawn(async move { coordinator.run(token).await })
        };

        coordinator.request_reload(true).await;
        assert!(registry.get("api-1").await.is_some());

        token.cancel();
        run_handle.await.unwrap();
    }
}
