//! The reverse-proxy data plane (spec.md §4.2): turns a matched `APISpec`
//! and an inbound request into an upstream round trip and back, through the
//! nine-step pipeline Setup → Director → Header hygiene → Transport
//! binding → Circuit breaker gate → Enforced timeout → Roundtrip →
//! Response handling → Error mapping.

pub mod circuit_breaker;
pub mod director;
pub mod error_mapping;
pub mod headers;
pub mod inmemory_loop;
pub mod response;
pub mod service_discovery;
pub mod target_selector;
pub mod timeout_gate;
pub mod transport;
pub mod upgrade;

use crate::config::Config;
use crate::errors::{GatewayError, GatewayResult};
use crate::registry::{ApiSpec, ApiSpecRegistry};
use axum::body::Body;
use bytes::Bytes;
use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerManager};
use http::{HeaderMap, Request, Response, Uri};
use http_body_util::BodyExt;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use inmemory_loop::InMemoryLoopRegistry;
use response::{FlushingBody, ProxyResponse};
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::{Duration, Instant};
use transport::{CachedTransport, HttpBody, TransportFactory};

/// Everything the proxy engine needs that outlives a single request:
/// transport factory, circuit breaker registry, and the in-memory loop
/// table, wired up once at startup.
pub struct ProxyEngine {
    registry: Arc<ApiSpecRegistry>,
    transport_factory: TransportFactory,
    circuit_breakers: CircuitBreakerManager,
    loop_registry: InMemoryLoopRegistry,
    round_robin_cursors: std::sync::Mutex<std::collections::HashMap<String, Arc<AtomicUsize>>>,
    proxy_default_timeout: Duration,
    max_conn_time: Duration,
    flush_interval_ms: i64,
}

impl ProxyEngine {
    pub fn new(config: &Config, registry: Arc<ApiSpecRegistry>) -> Self {
        let global = config
            .circuitbreaker
            .as_ref()
            .map(|c| &c.global)
            .cloned()
            .unwrap_or_default();

        Self {
            registry,
            transport_factory: TransportFactory::new(config),
            circuit_breakers: CircuitBreakerManager::new(CircuitBreakerConfig {
                samples: global.samples,
                threshold: global.threshold,
                reset_timeout: Duration::from_secs(global.reset_timeout_secs),
            }),
            loop_registry: InMemoryLoopRegistry::new(),
            round_robin_cursors: std::sync::Mutex::new(std::collections::HashMap::new()),
            proxy_default_timeout: Duration::from_secs(config.proxy.proxy_default_timeout_secs),
            max_conn_time: Duration::from_secs(config.proxy.max_conn_time_secs),
            flush_interval_ms: config.proxy.flush_interval_ms,
        }
    }

    /// Proxy an inbound request matched to `api_id`, running the full
    /// nine-step pipeline (spec.md §4.2).
    pub async fn serve(&self, api_id: &str, client_ip: IpAddr, mut request: Request<Body>) -> GatewayResult<ProxyResponse> {
        let started_at = Instant::now();

        // Step 1: setup — resolve the spec and select a target host.
        let spec = self
            .registry
            .get(api_id)
            .await
            .ok_or_else(|| GatewayError::not_found("api", api_id))?;

        let target_host = self.select_target(&spec).await?;

        // Step 2: director.
        let inbound_path = request.uri().path().to_string();
        let upstream_path = director::strip_listen_path(
            &inbound_path,
            &spec.definition.listen_path,
            spec.definition.strip_listen_path,
        );
        let rewritten = director::rewrite_uri(request.uri(), &target_host, &upstream_path)?;
        *request.uri_mut() = rewritten;

        // A protocol-switch request must keep its `Connection`/`Upgrade`
        // headers intact upstream and have its client-side hijack captured
        // before the body is consumed by the roundtrip (spec.md §4.2 step 8).
        let wants_upgrade = headers::wants_upgrade(request.headers());
        let client_upgrade = wants_upgrade.then(|| hyper::upgrade::on(&mut request));

        // Step 3: header hygiene.
        let original_host = request.headers().get(http::header::HOST).cloned();
        if !wants_upgrade {
            headers::strip_hop_by_hop(request.headers_mut());
        }
        headers::append_forwarded_for(request.headers_mut(), client_ip);
        let host_value = director::host_header(spec.definition.preserve_host_header, original_host.as_ref(), &target_host);
        request.headers_mut().insert(http::header::HOST, host_value);

        if let Some(rule) = self.matched_rule(&spec, &upstream_path) {
            headers::apply_rule_headers(request.headers_mut(), &rule.inject_headers, &rule.remove_headers);
        }

        // Step 4: transport binding.
        let transport = self.bind_transport(&spec, &target_host).await;

        // Step 5: circuit breaker gate.
        let breaker_key = format!("{}:{}", api_id, upstream_path);
        let breaker = self.circuit_breakers.get_or_create(&breaker_key, None).await;
        breaker
            .allow()
            .await
            .map_err(|e| error_mapping::map_circuit_breaker_error(e, &breaker_key))?;

        // Step 6: enforced timeout.
        let rule_timeout = self.matched_rule(&spec, &upstream_path).and_then(|r| r.hard_timeout_secs);
        let timeout = timeout_gate::effective_timeout(rule_timeout, self.proxy_default_timeout.as_secs());

        // Step 7: roundtrip (with in-memory loop short-circuit).
        let host_str = target_host.host().unwrap_or_default().to_string();
        let port = target_host.port_u16().unwrap_or(80);
        let loop_key = format!("{host_str}:{port}");

        let response = if let Some(handler) = self.loop_registry.lookup(&loop_key).await {
            let response = handler(request).await;
            breaker.record_success().await;
            response
        } else {
            let outcome = timeout_gate::enforce(timeout, self.roundtrip(&transport, request)).await?;
            match outcome {
                Ok(upstream_response) => {
                    breaker.record_success().await;
                    self.finalize_response(upstream_response, client_upgrade).await
                }
                Err(e) => {
                    breaker.record_failure().await;
                    return Err(error_mapping::map_client_error(e));
                }
            }
        };

        // Step 9: error mapping happens at the call site (the admin/proxy
        // HTTP layer) once it has this axum response.
        Ok(ProxyResponse {
            upstream_latency: started_at.elapsed(),
            response,
        })
    }

    /// Step 8: turn the upstream response into the one handed back to the
    /// client. A `101 Switching Protocols` reply is spliced byte-for-byte in
    /// a spawned task rather than framed as ordinary HTTP (spec.md §4.2 step
    /// 8); everything else has hop-by-hop headers stripped, its remaining
    /// headers copied onto a fresh map, and — when `FlushInterval` calls for
    /// eager flushing — its body wrapped so each upstream chunk reaches the
    /// client as soon as it arrives.
    async fn finalize_response(
        &self,
        mut upstream: Response<hyper::body::Incoming>,
        client_upgrade: Option<hyper::upgrade::OnUpgrade>,
    ) -> Response<Body> {
        if let Some(client_upgrade) = client_upgrade {
            if upgrade::is_upgrade_response(upstream.status()) {
                let upstream_upgrade = hyper::upgrade::on(&mut upstream);
                tokio::spawn(async move {
                    match (client_upgrade.await, upstream_upgrade.await) {
                        (Ok(client), Ok(upstream)) => {
                            if let Err(e) = upgrade::splice(client, upstream).await {
                                tracing::warn!("upgrade splice failed: {e}");
                            }
                        }
                        _ => tracing::warn!("upgrade hijack failed on client or upstream side"),
                    }
                });
                let (parts, _) = upstream.into_parts();
                return Response::from_parts(parts, Body::empty());
            }
        }

        let (mut parts, incoming) = upstream.into_parts();
        headers::strip_hop_by_hop(&mut parts.headers);
        let mut out_headers = HeaderMap::new();
        response::copy_response_headers(&parts.headers, &mut out_headers);
        parts.headers = out_headers;

        let body = Body::new(incoming.map_err(axum::Error::new));
        let body = if self.flush_interval_ms <= 0 {
            Body::from_stream(FlushingBody::new(body.into_data_stream()))
        } else {
            body
        };

        Response::from_parts(parts, body)
    }

    async fn select_target(&self, spec: &ApiSpec) -> GatewayResult<Uri> {
        if spec.definition.enable_load_balancing {
            let cursor = {
                let mut cursors = self.round_robin_cursors.lock().unwrap();
                cursors
                    .entry(spec.definition.api_id.clone())
                    .or_insert_with(|| Arc::new(AtomicUsize::new(0)))
                    .clone()
            };
            let hosts = if spec.definition.host_list.is_empty() {
                vec![spec.definition.target_url.clone()]
            } else {
                spec.definition.host_list.clone()
            };
            target_selector::select_round_robin(&hosts, &cursor).ok_or(GatewayError::AllHostsDown)
        } else {
            target_selector::select_single(&spec.definition.target_url).ok_or(GatewayError::AllHostsDown)
        }
    }

    fn matched_rule<'a>(&self, spec: &'a ApiSpec, path: &str) -> Option<crate::models::api_definition::ExtendedPathRule> {
        let version = spec.definition.version_definition.default.clone();
        let table = spec.match_tables.get(&version)?;
        crate::registry::path_rules::find_match(table, path).map(|entry| entry.rule.clone())
    }

    async fn bind_transport(&self, spec: &ApiSpec, target_host: &Uri) -> Arc<CachedTransport> {
        let mut mutable = spec.mutable.write().await;
        let h2c = target_host.scheme_str() == Some("h2c");
        if transport::should_recycle(&mutable.transport, self.max_conn_time) {
            let fresh = self
                .transport_factory
                .recycle(&mutable.transport, &spec.definition.tls, None, h2c);
            mutable.transport = Some(fresh);
        }
        mutable.transport.clone().expect("transport just ensured present")
    }

    async fn roundtrip(
        &self,
        transport: &CachedTransport,
        request: Request<Body>,
    ) -> Result<Response<hyper::body::Incoming>, hyper_util::client::legacy::Error> {
        let (parts, body) = request.into_parts();
        let bytes = body_to_bytes(body).await;
        let outbound = Request::from_parts(parts, HttpBody::new(bytes));
        transport.client.request(outbound).await
    }
}

async fn body_to_bytes(body: Body) -> Bytes {
    body.collect().await.map(|collected| collected.to_bytes()).unwrap_or_default()
}

pub type PooledClient = Client<HttpConnector, HttpBody>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_client_type_compiles() {
        fn _takes(_c: &PooledClient) {}
    }
}
