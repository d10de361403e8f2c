//! Policy — a named bundle of access rights and limits merged into sessions
//! (spec.md §3).

use super::session::{AccessDefinition, Limit};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Which parts of a policy are applied on merge. Mirrors spec.md §3's
/// `rate`, `quota`, `acl`, `complexity` partition flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Partitions {
    #[serde(default)]
    pub rate: bool,
    #[serde(default)]
    pub quota: bool,
    #[serde(default)]
    pub acl: bool,
    #[serde(default)]
    pub complexity: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub org_id: String,
    pub name: String,
    #[serde(default)]
    pub access_rights: HashMap<String, AccessDefinition>,
    #[serde(default)]
    pub limit: Option<Limit>,
    #[serde(default)]
    pub partitions: Partitions,
    #[serde(default)]
    pub tags: HashSet<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Trial period: newly-created keys expire `key_expires_in` seconds from
    /// creation when this policy is applied and they did not previously
    /// exist (spec.md §4.5).
    #[serde(default)]
    pub key_expires_in: i64,
}

/// Apply `policies` onto `session`, following the partition flags and
/// set-union semantics from spec.md §3/§8.
///
/// `key_is_new` drives the trial-period rule: `Expires` is only forced when
/// the key did not exist before this application.
pub fn apply_policies(session: &mut super::session::Session, policies: &[Policy], key_is_new: bool) {
    for policy in policies {
        if policy.partitions.acl || !has_any_partition(policy) {
            for (api_id, def) in &policy.access_rights {
                session
                    .access_rights
                    .entry(api_id.clone())
                    .and_modify(|existing| {
                        existing.allowed_versions = def.allowed_versions.clone();
                        existing.allowance_scope = def.allowance_scope.clone();
                    })
                    .or_insert_with(|| def.clone());
            }
        }

        if policy.partitions.quota || policy.partitions.rate || !has_any_partition(policy) {
            if let Some(limit) = &policy.limit {
                for def in session.access_rights.values_mut() {
                    def.limit = Some(limit.clone());
                }
            }
        }

        session.tags = session.tags.union(&policy.tags).cloned().collect();
        for (k, v) in &policy.metadata {
            session.metadata.entry(k.clone()).or_insert_with(|| v.clone());
        }

        if !session.apply_policies.contains(&policy.id) {
            session.apply_policies.push(policy.id.clone());
        }

        if key_is_new && policy.key_expires_in > 0 {
            session.expires = chrono::Utc::now().timestamp() + policy.key_expires_in;
        }
    }
}

fn has_any_partition(policy: &Policy) -> bool {
    policy.partitions.rate || policy.partitions.quota || policy.partitions.acl || policy.partitions.complexity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Session;

    fn sample_policy(id: &str) -> Policy {
        Policy {
            id: id.to_string(),
            org_id: "org1".to_string(),
            name: "sample".to_string(),
            access_rights: HashMap::from([("api-1".to_string(), AccessDefinition::default())]),
            limit: Some(Limit {
                quota_max: 1000,
                quota_renewal_rate: 3600,
                ..Default::default()
            }),
            partitions: Partitions::default(),
            tags: HashSet::from(["beta".to_string()]),
            metadata: HashMap::new(),
            key_expires_in: 0,
        }
    }

    #[test]
    fn apply_policies_unions_tags_and_access_rights() {
        let mut session = Session::new("key1", "org1");
        apply_policies(&mut session, &[sample_policy("p1")], false);
        assert!(session.access_rights.contains_key("api-1"));
        assert!(session.tags.contains("beta"));
        assert_eq!(session.apply_policies, vec!["p1".to_string()]);
    }

    #[test]
    fn trial_period_only_applies_to_new_keys() {
        let mut policy = sample_policy("p1");
        policy.key_expires_in = 100;

        let mut existing = Session::new("key1", "org1");
        existing.expires = 0;
        apply_policies(&mut existing, &[policy.clone()], false);
        assert_eq!(existing.expires, 0);

        let mut fresh = Session::new("key2", "org1");
        apply_policies(&mut fresh, &[policy], true);
        assert!(fresh.expires > 0);
    }
}
