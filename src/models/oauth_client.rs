//! OAuth Client — per-API client identity (spec.md §3, §4.7).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthClient {
    pub client_id: String,
    pub api_id: String,
    /// Either the plaintext secret or a hash, tagged by `secret_is_hashed`.
    pub secret: String,
    #[serde(default)]
    pub secret_is_hashed: bool,
    pub redirect_uri: String,
    pub policy_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A per-client issued token, tracked for the sorted-set-by-expiry listing
/// described in spec.md §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthToken {
    pub token: String,
    pub client_id: String,
    pub expires_at: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
