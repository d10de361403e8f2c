//! Header hygiene (spec.md §4.2 step 3): strip hop-by-hop headers, append
//! `X-Forwarded-For`, and apply per-rule inject/remove lists from matched
//! extended-path rules.

use http::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::net::IpAddr;

/// RFC 7230 §6.1 hop-by-hop headers plus `Connection`'s named extras, never
/// forwarded upstream or back to the client.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any header named in the
/// `Connection` header's value (so a misbehaving client can't smuggle an
/// extra hop-by-hop header past the static list).
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    if let Some(connection) = headers.get(http::header::CONNECTION) {
        if let Ok(value) = connection.to_str() {
            let named: Vec<String> = value.split(',').map(|s| s.trim().to_lowercase()).collect();
            for name in named {
                if let Ok(header_name) = HeaderName::try_from(name) {
                    headers.remove(header_name);
                }
            }
        }
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Append the client's address to `X-Forwarded-For`, preserving any
/// existing chain (spec.md §4.2 step 3).
pub fn append_forwarded_for(headers: &mut HeaderMap, client_ip: IpAddr) {
    let name = HeaderName::from_static("x-forwarded-for");
    let new_value = match headers.get(&name).and_then(|v| v.to_str().ok()) {
        Some(existing) if !existing.is_empty() => format!("{existing}, {client_ip}"),
        _ => client_ip.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&new_value) {
        headers.insert(name, value);
    }
}

/// True when the client is asking to switch protocols (WebSocket, h2c), so
/// the caller must capture `hyper::upgrade::on` before the request is
/// consumed (spec.md §4.2 step 8).
pub fn wants_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(http::header::UPGRADE)
        .is_some_and(|_| true)
        && headers
            .get(http::header::CONNECTION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.split(',').any(|tok| tok.trim().eq_ignore_ascii_case("upgrade")))
}

/// Apply a matched extended-path rule's header inject/remove lists.
pub fn apply_rule_headers(headers: &mut HeaderMap, inject: &HashMap<String, String>, remove: &[String]) {
    for key in remove {
        if let Ok(name) = HeaderName::try_from(key.as_str()) {
            headers.remove(name);
        }
    }
    for (key, value) in inject {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(key.as_str()), HeaderValue::from_str(value)) {
            headers.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONNECTION;

    #[test]
    fn strips_static_and_dynamic_hop_by_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("x-custom-hop"));
        headers.insert("x-custom-hop", HeaderValue::from_static("drop-me"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-keep", HeaderValue::from_static("keep-me"));

        strip_hop_by_hop(&mut headers);

        assert!(!headers.contains_key("x-custom-hop"));
        assert!(!headers.contains_key("keep-alive"));
        assert!(!headers.contains_key(CONNECTION));
        assert!(headers.contains_key("x-keep"));
    }

    #[test]
    fn appends_to_existing_forwarded_for_chain() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        append_forwarded_for(&mut headers, "10.0.0.2".parse().unwrap());
        assert_eq!(headers.get("x-forwarded-for").unwrap(), "10.0.0.1, 10.0.0.2");
    }
}
