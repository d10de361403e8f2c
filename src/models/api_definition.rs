//! Classic API Definition — the authoritative per-API configuration
//! (spec.md §3).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
    Tcp,
    Tls,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsSettings {
    #[serde(default)]
    pub pin_to_common_name: bool,
    #[serde(default)]
    pub client_cert_id: Option<String>,
    #[serde(default)]
    pub min_version: Option<String>,
    #[serde(default)]
    pub max_version: Option<String>,
    #[serde(default)]
    pub cipher_suites: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceDiscoveryConfig {
    #[serde(default)]
    pub use_discovery_service: bool,
    #[serde(default)]
    pub query_endpoint: Option<String>,
    #[serde(default)]
    pub cache_timeout_secs: Option<u64>,
}

/// Where a version identifier is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionLocation {
    Header,
    UrlParam,
}

/// `version_definition` — the base API's version graph (spec.md §3, §4.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionDefinition {
    #[serde(default)]
    pub name: String,
    pub location: Option<VersionLocation>,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub default: String,
    /// version name -> child API ID.
    #[serde(default)]
    pub versions: HashMap<String, String>,
    /// Set only on children; points back at the base that lists them.
    #[serde(default)]
    pub base_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitBreakerImplementation {
    Simple,
    Noop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerRule {
    pub samples: u32,
    pub threshold: f64,
    #[serde(default)]
    pub implementation: Option<CircuitBreakerImplementation>,
}

/// A single extended-path entry: URL+method annotated with a behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendedPathRule {
    pub path: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub allow: bool,
    #[serde(default)]
    pub block: bool,
    #[serde(default)]
    pub transform: Option<String>,
    #[serde(default)]
    pub inject_headers: HashMap<String, String>,
    #[serde(default)]
    pub remove_headers: Vec<String>,
    #[serde(default)]
    pub mock_response: Option<MockResponse>,
    #[serde(default)]
    pub circuit_breaker: Option<CircuitBreakerRule>,
    #[serde(default)]
    pub hard_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockResponse {
    pub status_code: u16,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Per-version rule set, keyed by version name in `VersionDefinition::versions`
/// (or a single entry named after `VersionDefinition::name` for a
/// non-versioned API).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtendedPaths {
    #[serde(default)]
    pub rules: Vec<ExtendedPathRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub use_keyless: bool,
    #[serde(default)]
    pub use_basic_auth: bool,
    #[serde(default)]
    pub use_standard_auth: bool,
    #[serde(default)]
    pub auth_header_name: Option<String>,
}

/// The Classic API Definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiDefinition {
    pub api_id: String,
    pub org_id: String,
    pub name: String,
    pub listen_path: String,
    #[serde(default)]
    pub strip_listen_path: bool,
    pub target_url: String,
    #[serde(default)]
    pub host_list: Vec<String>,
    #[serde(default = "default_protocol")]
    pub protocol: Protocol,
    #[serde(default)]
    pub tls: TlsSettings,
    #[serde(default)]
    pub service_discovery: ServiceDiscoveryConfig,
    #[serde(default)]
    pub enable_load_balancing: bool,
    #[serde(default)]
    pub preserve_host_header: bool,
    #[serde(default)]
    pub disable_strip_slash: bool,
    #[serde(default)]
    pub extended_paths: HashMap<String, ExtendedPaths>,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub use_oauth2: bool,
    #[serde(default)]
    pub is_oas: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub version_definition: VersionDefinition,
    /// Skip the quota-reset-on-create step for sessions scoped to this API
    /// (spec.md §4.5's quota-reset rule).
    #[serde(default)]
    pub dont_set_quotas_on_create: bool,
}

fn default_protocol() -> Protocol {
    Protocol::Http
}

impl ApiDefinition {
    /// Name of the version a given request resolves to by default, i.e. the
    /// base's own version when it is not itself a version child.
    pub fn base_version_name(&self) -> &str {
        if self.version_definition.name.is_empty() {
            "Default"
        } else {
            &self.version_definition.name
        }
    }

    /// True when this definition is a "base" (has at least one listed child).
    pub fn is_base(&self) -> bool {
        !self.version_definition.versions.is_empty()
    }
}
