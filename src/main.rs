use anyhow::Result;
use apigateway::config::Config;
use apigateway::controlplane::{self, AppState};
use apigateway::models::{ApiDefinition, OasDocument};
use apigateway::notifications::NotificationBus;
use apigateway::oauth::OauthClientRegistry;
use apigateway::proxy::ProxyEngine;
use apigateway::registry::{ApiSpec, ApiSpecRegistry};
use apigateway::reload::ReloadCoordinator;
use apigateway::session::memory_store::MemorySessionStore;
use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::IntoResponse;
use clap::Parser;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "apigateway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reverse-proxy API gateway with hot-reloadable API definitions")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address (overrides config file)
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port (overrides config file)
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Load every `{AppPath}/{APIID}.json` Classic definition (and its paired
/// `{APIID}-oas.json` OAS companion, if present) into a fresh registry
/// snapshot (spec.md §6).
fn load_definitions(app_path: &str) -> Result<HashMap<String, Arc<ApiSpec>>> {
    let mut specs = HashMap::new();
    let dir = match std::fs::read_dir(app_path) {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!("app_path '{app_path}' unreadable ({e}); starting with an empty registry");
            return Ok(specs);
        }
    };

    for entry in dir.flatten() {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.ends_with(".json") || file_name.ends_with("-oas.json") {
            continue;
        }

        let raw = std::fs::read_to_string(&path)?;
        let definition: ApiDefinition = serde_json::from_str(&raw)?;

        let oas_path = path.with_file_name(format!("{}-oas.json", definition.api_id));
        let oas = if definition.is_oas && oas_path.exists() {
            let oas_raw = std::fs::read_to_string(&oas_path)?;
            Some(OasDocument::new(serde_json::from_str(&oas_raw)?))
        } else {
            None
        };

        specs.insert(definition.api_id.clone(), Arc::new(ApiSpec::new(definition, oas)));
    }

    Ok(specs)
}

/// Fallback handler for every request not matched by an admin route: finds
/// the `APISpec` whose `listen_path` prefixes the request and hands it to
/// the `ProxyEngine` (spec.md §4.2).
async fn proxy_fallback(State(state): State<Arc<GatewayState>>, request: Request<Body>) -> axum::response::Response {
    let path = request.uri().path().to_string();
    let specs = state.registry.snapshot().await;
    let matched = specs
        .into_iter()
        .filter(|spec| spec.definition.enabled && path.starts_with(&spec.definition.listen_path))
        .max_by_key(|spec| spec.definition.listen_path.len());

    let Some(spec) = matched else {
        return apigateway::errors::GatewayError::not_found("api", path).into_response();
    };

    let client_ip = request
        .extensions()
        .get::<axum::extract::ConnectInfo<SocketAddr>>()
        .map(|connect_info| connect_info.0.ip())
        .unwrap_or_else(|| "0.0.0.0".parse().unwrap());

    match state.proxy.serve(&spec.definition.api_id, client_ip, request).await {
        Ok(proxy_response) => proxy_response.response,
        Err(e) => e.into_response(),
    }
}

struct GatewayState {
    registry: Arc<ApiSpecRegistry>,
    proxy: ProxyEngine,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("apigateway={}", cli.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting apigateway v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    let config = Arc::new(config);
    info!("configuration loaded from {}", cli.config);

    let registry = Arc::new(ApiSpecRegistry::new());
    let initial = load_definitions(&config.storage.app_path)?;
    info!("loaded {} api definitions from {}", initial.len(), config.storage.app_path);
    registry.swap(initial).await;

    let notifications = NotificationBus::new(b"change-me".to_vec());
    let sessions: Arc<dyn apigateway::session::SessionStore> = Arc::new(MemorySessionStore::new());
    let policies = Arc::new(RwLock::new(HashMap::new()));
    let oauth = Arc::new(OauthClientRegistry::new());

    let app_path_for_loader = config.storage.app_path.clone();
    let loader: apigateway::reload::RegistryLoader = Arc::new(move || {
        let app_path = app_path_for_loader.clone();
        Box::pin(async move { load_definitions(&app_path) })
    });
    let reload = Arc::new(ReloadCoordinator::new(registry.clone(), notifications.clone(), loader));

    let cancellation_token = CancellationToken::new();
    let reload_task = {
        let reload = reload.clone();
        let token = cancellation_token.clone();
        tokio::spawn(async move { reload.run(token).await })
    };

    let proxy = ProxyEngine::new(&config, registry.clone());

    let admin_state = AppState {
        config: config.clone(),
        registry: registry.clone(),
        sessions,
        policies,
        oauth,
        reload: reload.clone(),
        notifications,
    };

    let gateway_state = Arc::new(GatewayState {
        registry: registry.clone(),
        proxy,
    });

    let app = controlplane::router(admin_state).fallback(axum::routing::any(proxy_fallback).with_state(gateway_state));

    let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(cancellation_token.clone()))
        .await?;

    cancellation_token.cancel();
    reload_task.await?;
    Ok(())
}

async fn shutdown_signal(cancellation_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };
    tokio::select! {
        _ = ctrl_c => {},
        _ = cancellation_token.cancelled() => {},
    }
    info!("shutdown signal received");
}
