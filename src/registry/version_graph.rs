//! Base/child version-graph operations (spec.md §4.1, §9).
//!
//! A base API's `version_definition.versions` maps version name -> child API
//! ID; children carry a `base_id` back-pointer. Every mutation that touches
//! this relationship writes the base atomically alongside the child, as a
//! single registry write (spec.md §4.5 validation rules).

use crate::models::ApiDefinition;

/// Header emitted on GET of a version child (spec.md §4.1, §8).
pub const BASE_API_ID_HEADER: &str = "X-Tyk-Base-API-ID";

/// Returns the base API ID to surface in `X-Tyk-Base-API-ID` for `child`,
/// iff `base` still lists `child.api_id` in its version map.
pub fn base_header_value(base: &ApiDefinition, child_api_id: &str) -> Option<String> {
    base.version_definition
        .versions
        .values()
        .any(|id| id == child_api_id)
        .then(|| base.api_id.clone())
}

/// Remove `child_api_id` from `base`'s version map. If it was the default,
/// the default reverts to the base's own version name (spec.md §4.1, §8).
/// Returns true if an entry was removed.
pub fn remove_child(base: &mut ApiDefinition, child_api_id: &str) -> bool {
    let removed_name = base
        .version_definition
        .versions
        .iter()
        .find(|(_, id)| id.as_str() == child_api_id)
        .map(|(name, _)| name.clone());

    let Some(name) = removed_name else {
        return false;
    };
    base.version_definition.versions.remove(&name);

    if base.version_definition.default == name {
        base.version_definition.default = base.base_version_name().to_string();
    }
    true
}

/// Add a child under `version_name`, optionally making it the default
/// (spec.md §4.1's "symmetrically, creating a child ... rewrites the base's
/// map").
pub fn add_child(base: &mut ApiDefinition, version_name: &str, child_api_id: &str, set_default: bool) {
    base.version_definition
        .versions
        .insert(version_name.to_string(), child_api_id.to_string());
    if set_default {
        base.version_definition.default = version_name.to_string();
    }
}

/// Resolved decision to open question #2 in spec.md §9: deleting a base API
/// cascades to clear each child's `base_id` rather than leaving it dangling.
pub fn cascade_clear_base_id(children: &mut [&mut ApiDefinition], base_id: &str) {
    for child in children.iter_mut() {
        if child.version_definition.base_id.as_deref() == Some(base_id) {
            child.version_definition.base_id = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::api_definition::VersionDefinition;
    use std::collections::HashMap;

    fn base_with(versions: &[(&str, &str)], default: &str) -> ApiDefinition {
        let mut def = sample_def("base-1");
        def.version_definition = VersionDefinition {
            name: "base".to_string(),
            location: None,
            key: String::new(),
            default: default.to_string(),
            versions: versions
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            base_id: None,
        };
        def
    }

    fn sample_def(id: &str) -> ApiDefinition {
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
            version_definition: VersionDefinition::default(),
            dont_set_quotas_on_create: false,
        }
    }

    #[test]
    fn removes_entry_and_reverts_default() {
        let mut base = base_with(&[("v2", "child-1")], "v2");
        assert!(remove_child(&mut base, "child-1"));
        assert!(base.version_definition.versions.is_empty());
        assert_eq!(base.version_definition.default, "base");
    }

    #[test]
    fn non_default_removal_keeps_default() {
        let mut base = base_with(&[("v1", "child-1"), ("v2", "child-2")], "v1");
        assert!(remove_child(&mut base, "child-2"));
        assert_eq!(base.version_definition.default, "v1");
    }

    #[test]
    fn base_header_only_for_listed_children() {
        let base = base_with(&[("v2", "child-1")], "v2");
        assert_eq!(base_header_value(&base, "child-1"), Some("base-1".to_string()));
        assert_eq!(base_header_value(&base, "child-2"), None);
    }

    #[test]
    fn cascade_clear_only_touches_matching_children() {
        let mut child_a = sample_def("child-a");
        child_a.version_definition.base_id = Some("base-1".to_string());
        let mut child_b = sample_def("child-b");
        child_b.version_definition.base_id = Some("base-2".to_string());

        cascade_clear_base_id(&mut [&mut child_a, &mut child_b], "base-1");
        assert_eq!(child_a.version_definition.base_id, None);
        assert_eq!(child_b.version_definition.base_id, Some("base-2".to_string()));
    }
}
