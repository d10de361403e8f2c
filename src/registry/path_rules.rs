//! Precomputed per-version path match tables (spec.md §3's "APISpec" entry).

use crate::models::api_definition::ExtendedPathRule;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub regex: Regex,
    pub rule: ExtendedPathRule,
}

/// Compile a version's extended-path rules into matchable regexes. A literal
/// path is anchored and `{param}` segments become a wildcard group, mirroring
/// the teacher's regex-based route matching in `filter_parser`/`expression`.
pub fn compile(rules: &[ExtendedPathRule]) -> Vec<CompiledRule> {
    rules
        .iter()
        .filter_map(|rule| {
            let pattern = path_to_regex(&rule.path);
            Regex::new(&pattern).ok().map(|regex| CompiledRule {
                regex,
                rule: rule.clone(),
            })
        })
        .collect()
}

fn path_to_regex(path: &str) -> String {
    let mut out = String::from("^");
    for segment in path.split('/') {
        if segment.is_empty() {
            continue;
        }
        out.push('/');
        if segment.starts_with('{') && segment.ends_with('}') {
            out.push_str("[^/]+");
        } else {
            out.push_str(&regex::escape(segment));
        }
    }
    out.push('$');
    out
}

/// Find the first rule (in declaration order) matching `path`, for the given
/// compiled table.
pub fn find_match<'a>(table: &'a [CompiledRule], path: &str) -> Option<&'a CompiledRule> {
    table.iter().find(|entry| entry.regex.is_match(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_and_matches_param_segment() {
        let rules = vec![ExtendedPathRule {
            path: "/users/{id}".to_string(),
            method: None,
            allow: true,
            block: false,
            transform: None,
            inject_headers: Default::default(),
            remove_headers: Vec::new(),
            mock_response: None,
            circuit_breaker: None,
            hard_timeout_secs: None,
        }];
        let table = compile(&rules);
        assert!(find_match(&table, "/users/42").is_some());
        assert!(find_match(&table, "/users/42/orders").is_none());
    }
}
