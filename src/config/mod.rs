//! Process-wide configuration, loaded once at startup.
//!
//! Follows the teacher's `figment`-based layering: a TOML file merged with
//! `GATEWAY_`-prefixed environment variables, falling back to defaults when
//! no file is present. The recognized options are exactly the set spec.md §6
//! names.

pub mod defaults;

use anyhow::Result;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub oauth: OauthConfig,
    pub circuitbreaker: Option<CircuitBreakerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig::default(),
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
            proxy: ProxyConfig::default(),
            oauth: OauthConfig::default(),
            circuitbreaker: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `AppPath`/`PolicyPath` — where API definitions and policies are persisted
/// as `{AppPath}/{APIID}.json`, `{AppPath}/{APIID}-oas.json`,
/// `{PolicyPath}/{PolicyID}.json` (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_app_path")]
    pub app_path: String,
    #[serde(default = "default_policy_path")]
    pub policy_path: String,
    /// `PolicySource`: `file` | `service`.
    #[serde(default)]
    pub policy_source: PolicySource,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            app_path: default_app_path(),
            policy_path: default_policy_path(),
            policy_source: PolicySource::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicySource {
    #[default]
    File,
    Service,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashKeyFunction {
    Murmur32,
    #[default]
    Murmur64,
    Murmur128,
    Sha256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub hash_keys: bool,
    #[serde(default)]
    pub hash_key_function: HashKeyFunction,
    #[serde(default)]
    pub enable_hashed_keys_listing: bool,
    #[serde(default)]
    pub disable_key_actions_by_username: bool,
    #[serde(default)]
    pub allow_master_keys: bool,
    #[serde(default)]
    pub supress_default_org_store: bool,
    #[serde(default = "default_basic_auth_hash_key_function")]
    pub basic_auth_hash_key_function: String,
    #[serde(default = "default_oauth_token_expire_secs")]
    pub oauth_token_expire: i64,
    #[serde(default = "default_oauth_token_expired_retain_secs")]
    pub oauth_token_expired_retain_period: i64,
    #[serde(default)]
    pub force_global_session_lifetime: bool,
    #[serde(default)]
    pub global_session_lifetime: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hash_keys: false,
            hash_key_function: HashKeyFunction::default(),
            enable_hashed_keys_listing: false,
            disable_key_actions_by_username: false,
            allow_master_keys: false,
            supress_default_org_store: false,
            basic_auth_hash_key_function: default_basic_auth_hash_key_function(),
            oauth_token_expire: default_oauth_token_expire_secs(),
            oauth_token_expired_retain_period: default_oauth_token_expired_retain_secs(),
            force_global_session_lifetime: false,
            global_session_lifetime: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthConfig {
    #[serde(default = "default_reload_debounce_ms")]
    pub reload_debounce_ms: u64,
}

impl Default for OauthConfig {
    fn default() -> Self {
        Self {
            reload_debounce_ms: default_reload_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_max_conn_time_secs")]
    pub max_conn_time_secs: u64,
    #[serde(default = "default_max_idle_conns")]
    pub max_idle_conns: usize,
    #[serde(default = "default_max_idle_conns_per_host")]
    pub max_idle_conns_per_host: usize,
    #[serde(default = "default_proxy_default_timeout_secs")]
    pub proxy_default_timeout_secs: u64,
    #[serde(default)]
    pub ssl_insecure_skip_verify: bool,
    #[serde(default)]
    pub ssl_force_common_name_check: bool,
    #[serde(default)]
    pub enable_http2: bool,
    #[serde(default)]
    pub close_connections: bool,
    #[serde(default)]
    pub ignore_canonical_mime_header_key: bool,
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: i64,
    #[serde(default)]
    pub enable_websockets: bool,
    #[serde(default)]
    pub skip_target_path_escaping: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            max_conn_time_secs: default_max_conn_time_secs(),
            max_idle_conns: default_max_idle_conns(),
            max_idle_conns_per_host: default_max_idle_conns_per_host(),
            proxy_default_timeout_secs: default_proxy_default_timeout_secs(),
            ssl_insecure_skip_verify: false,
            ssl_force_common_name_check: false,
            enable_http2: false,
            close_connections: false,
            ignore_canonical_mime_header_key: false,
            flush_interval_ms: default_flush_interval_ms(),
            enable_websockets: true,
            skip_target_path_escaping: false,
        }
    }
}

/// Circuit breaker configuration: a global default profile plus optional
/// per-service overrides, keyed the same way the teacher's
/// `CircuitBreakerManager` resolves profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default)]
    pub global: CircuitBreakerProfileConfig,
    #[serde(default)]
    pub profiles: HashMap<String, CircuitBreakerProfileConfig>,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            global: CircuitBreakerProfileConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerProfileConfig {
    pub samples: u32,
    pub threshold: f64,
    pub operation_timeout_secs: u64,
    pub reset_timeout_secs: u64,
}

impl Default for CircuitBreakerProfileConfig {
    fn default() -> Self {
        Self {
            samples: 20,
            threshold: 0.5,
            operation_timeout_secs: 10,
            reset_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if !std::path::Path::new(config_file).exists() {
            tracing::warn!(
                "config file '{}' not found, using default configuration values",
                config_file
            );
            let config: Config = Figment::new()
                .merge(Serialized::defaults(Self::default()))
                .merge(Env::prefixed("GATEWAY_").split("__"))
                .extract()?;
            return Ok(config);
        }

        let config: Config = Figment::new()
            .merge(Toml::file(config_file))
            .merge(Env::prefixed("GATEWAY_").split("__"))
            .extract()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_figment() {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .extract()
            .expect("default config must extract");
        assert_eq!(config.web.port, default_port());
        assert_eq!(config.proxy.max_idle_conns, default_max_idle_conns());
    }
}
