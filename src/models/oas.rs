//! OAS (OpenAPI 3.0) API Definition carrying the `x-tyk-api-gateway` vendor
//! extension (spec.md §3, §9 "Dynamic vendor extension unmarshalling").
//!
//! The document is stored as an opaque `serde_json::Value`; the extension is
//! materialized into a typed `XTykApiGateway` the first time it is read and
//! the typed value is cached alongside the document, not folded into a
//! struct field — callers that mutate the extension must go through
//! `OasDocument::set_extension`, which re-serializes and invalidates the
//! cache.

use crate::errors::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;

pub const EXTENSION_KEY: &str = "x-tyk-api-gateway";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XTykInfo {
    pub id: String,
    #[serde(default)]
    pub org_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: XTykState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XTykState {
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XTykListenPath {
    pub value: String,
    #[serde(default)]
    pub strip: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XTykUpstream {
    pub url: String,
    #[serde(default)]
    pub load_balancing: Option<XTykLoadBalancing>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XTykLoadBalancing {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XTykServer {
    #[serde(default)]
    pub listen_path: XTykListenPath,
}

/// The `x-tyk-api-gateway` vendor extension, projecting onto the Classic
/// definition's fields (spec.md §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XTykApiGateway {
    pub info: XTykInfo,
    #[serde(default)]
    pub upstream: XTykUpstream,
    #[serde(default)]
    pub server: XTykServer,
    #[serde(default)]
    pub middleware: serde_json::Map<String, Value>,
}

/// An OAS document plus the gateway's live handle on it.
pub struct OasDocument {
    pub raw: Value,
    extension_cache: Mutex<Option<XTykApiGateway>>,
}

impl Clone for OasDocument {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            extension_cache: Mutex::new(self.extension_cache.lock().unwrap().clone()),
        }
    }
}

impl std::fmt::Debug for OasDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OasDocument").field("raw", &self.raw).finish()
    }
}

impl OasDocument {
    pub fn new(raw: Value) -> Self {
        Self {
            raw,
            extension_cache: Mutex::new(None),
        }
    }

    pub fn has_extension(&self) -> bool {
        self.raw.get(EXTENSION_KEY).is_some()
    }

    /// Materialize (and memoize) the vendor extension.
    pub fn extension(&self) -> GatewayResult<XTykApiGateway> {
        let mut cache = self.extension_cache.lock().unwrap();
        if let Some(ext) = cache.as_ref() {
            return Ok(ext.clone());
        }
        let value = self
            .raw
            .get(EXTENSION_KEY)
            .cloned()
            .ok_or_else(|| GatewayError::validation("missing x-tyk-api-gateway extension"))?;
        let ext: XTykApiGateway = serde_json::from_value(value)
            .map_err(|e| GatewayError::ValidationFailed(format!("invalid vendor extension: {e}")))?;
        *cache = Some(ext.clone());
        Ok(ext)
    }

    /// Overlay a new extension, re-embedding it into `raw` and invalidating
    /// the memoized copy.
    pub fn set_extension(&mut self, ext: XTykApiGateway) -> GatewayResult<()> {
        let value = serde_json::to_value(&ext)
            .map_err(|e| GatewayError::internal(format!("failed to serialize extension: {e}")))?;
        self.raw
            .as_object_mut()
            .ok_or_else(|| GatewayError::validation("OAS document root must be an object"))?
            .insert(EXTENSION_KEY.to_string(), value);
        *self.extension_cache.lock().unwrap() = Some(ext);
        Ok(())
    }

    pub fn servers(&self) -> Vec<String> {
        self.raw
            .get("servers")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|s| s.get("url").and_then(|u| u.as_str()).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ensure the gateway-managed URL is the first `servers` entry,
    /// preserving user-added entries after it (spec.md §3 invariant,
    /// validated by the §8 round-trip law).
    pub fn set_gateway_server_url(&mut self, gateway_url: &str) -> GatewayResult<()> {
        let obj = self
            .raw
            .as_object_mut()
            .ok_or_else(|| GatewayError::validation("OAS document root must be an object"))?;
        let servers = obj
            .entry("servers")
            .or_insert_with(|| Value::Array(Vec::new()));
        let arr = servers
            .as_array_mut()
            .ok_or_else(|| GatewayError::validation("servers must be an array"))?;

        let already_first = arr
            .first()
            .and_then(|s| s.get("url"))
            .and_then(|u| u.as_str())
            .map(|u| u == gateway_url)
            .unwrap_or(false);

        if !already_first {
            let mut entry = serde_json::Map::new();
            entry.insert("url".to_string(), Value::String(gateway_url.to_string()));
            arr.insert(0, Value::Object(entry));
        }
        Ok(())
    }

    /// Strip the vendor extension for public export (`?mode=public`).
    pub fn without_extension(&self) -> Value {
        let mut raw = self.raw.clone();
        if let Some(obj) = raw.as_object_mut() {
            obj.remove(EXTENSION_KEY);
        }
        raw
    }
}
