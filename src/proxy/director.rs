//! Director (spec.md §4.2 step 2): rewrites an inbound request's URL/headers
//! to target the selected upstream host, the same responsibility the
//! teacher's `reqwest`-based forwarders collapse into request-building —
//! here split out because `hyper::Request` is mutated in place.

use crate::errors::GatewayError;
use http::{HeaderValue, Uri, uri::Scheme};

/// Join a listen path prefix and an upstream path without producing a
/// double or missing slash, mirroring the classic reverse-proxy
/// `singleJoiningSlash` helper.
pub fn single_joining_slash(a: &str, b: &str) -> String {
    let a_slash = a.ends_with('/');
    let b_slash = b.starts_with('/');
    match (a_slash, b_slash) {
        (true, true) => format!("{}{}", a, &b[1..]),
        (false, false) if !b.is_empty() => format!("{}/{}", a, b),
        _ => format!("{}{}", a, b),
    }
}

/// Strip the API's listen path prefix from the inbound path, if configured
/// to do so (spec.md §3 `StripListenPath`).
pub fn strip_listen_path(path: &str, listen_path: &str, strip: bool) -> String {
    if !strip {
        return path.to_string();
    }
    let trimmed_prefix = listen_path.trim_end_matches('/');
    path.strip_prefix(trimmed_prefix).unwrap_or(path).to_string()
}

/// Rewrite `uri`'s scheme/authority/path to point at `target_host`, joining
/// its path with `upstream_path` (spec.md §4.2 step 2).
pub fn rewrite_uri(uri: &Uri, target_host: &Uri, upstream_path: &str) -> Result<Uri, GatewayError> {
    let scheme = target_host.scheme().cloned().unwrap_or(Scheme::HTTP);
    let authority = target_host
        .authority()
        .cloned()
        .ok_or_else(|| GatewayError::internal("target host has no authority"))?;

    let target_base_path = target_host.path().trim_end_matches('/');
    let joined_path = single_joining_slash(target_base_path, upstream_path);
    let path_and_query = match uri.query() {
        Some(q) if !q.is_empty() => format!("{}?{}", joined_path, q),
        _ => joined_path,
    };

    Uri::builder()
        .scheme(scheme)
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| GatewayError::internal(format!("uri rewrite failed: {e}")))
}

/// `Host` header value to present upstream, honoring `PreserveHostHeader`
/// (spec.md §3, §4.2 step 2).
pub fn host_header(preserve_host_header: bool, original_host: Option<&HeaderValue>, target_host: &Uri) -> HeaderValue {
    if preserve_host_header {
        if let Some(original) = original_host {
            return original.clone();
        }
    }
    target_host
        .authority()
        .map(|a| a.as_str())
        .and_then(|s| HeaderValue::from_str(s).ok())
        .unwrap_or_else(|| HeaderValue::from_static(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_without_double_slash() {
        assert_eq!(single_joining_slash("/api/", "/users"), "/api/users");
        assert_eq!(single_joining_slash("/api", "users"), "/api/users");
        assert_eq!(single_joining_slash("/api", "/users"), "/api/users");
    }

    #[test]
    fn strip_listen_path_removes_prefix_only_when_enabled() {
        assert_eq!(strip_listen_path("/v1/users", "/v1", true), "/users");
        assert_eq!(strip_listen_path("/v1/users", "/v1", false), "/v1/users");
    }

    #[test]
    fn rewrite_uri_combines_target_and_upstream_path() {
        let uri: Uri = "/users/42?x=1".parse().unwrap();
        let target: Uri = "http://upstream.internal/base".parse().unwrap();
        let rewritten = rewrite_uri(&uri, &target, "/users/42").unwrap();
        assert_eq!(rewritten.to_string(), "http://upstream.internal/base/users/42?x=1");
    }
}
