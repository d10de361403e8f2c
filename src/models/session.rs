//! Session — per-credential state (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Limit {
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub per_secs: i64,
    #[serde(default)]
    pub quota_max: i64,
    #[serde(default)]
    pub quota_renewal_rate: i64,
    #[serde(default)]
    pub quota_renews: i64,
    #[serde(default)]
    pub quota_remaining: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessDefinition {
    #[serde(default)]
    pub allowed_versions: Vec<String>,
    #[serde(default)]
    pub limit: Option<Limit>,
    #[serde(default)]
    pub allowance_scope: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Bcrypt,
    Plaintext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicAuthData {
    pub hash_type: HashAlgorithm,
    pub hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub key_id: String,
    pub org_id: String,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// 0 means "never expires".
    #[serde(default)]
    pub expires: i64,
    /// API ID -> access definition.
    #[serde(default)]
    pub access_rights: HashMap<String, AccessDefinition>,
    #[serde(default)]
    pub basic_auth_data: Option<BasicAuthData>,
    #[serde(default)]
    pub certificate: Option<String>,
    #[serde(default)]
    pub apply_policies: Vec<String>,
    #[serde(default)]
    pub tags: HashSet<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub is_inactive: bool,
}

impl Session {
    pub fn new(key_id: impl Into<String>, org_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key_id: key_id.into(),
            org_id: org_id.into(),
            created: now,
            last_updated: now,
            ..Default::default()
        }
    }

    /// Master keys are sessions with an empty access-rights map; per spec.md
    /// §4.5 and the resolved open question, the `AllowMasterKeys` check
    /// applies identically whether the session is being created or updated.
    pub fn is_master_key_candidate(&self) -> bool {
        self.access_rights.is_empty()
    }
}
