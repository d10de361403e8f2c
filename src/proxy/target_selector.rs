//! Target selection (spec.md §4.2 step 1, §4.3): round-robin over an API's
//! live host list, falling back to the `AllHostsDown` sentinel when the
//! list is empty.

use http::Uri;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Select the next host from `hosts` using a monotonically advancing
/// cursor, so concurrent requests fan out round-robin rather than all
/// hitting host 0 (spec.md §4.3 `EnableLoadBalancing`).
pub fn select_round_robin(hosts: &[String], cursor: &AtomicUsize) -> Option<Uri> {
    if hosts.is_empty() {
        return None;
    }
    let index = cursor.fetch_add(1, Ordering::Relaxed) % hosts.len();
    hosts[index].parse::<Uri>().ok()
}

/// Single-target selection for APIs with load balancing disabled: always the
/// first configured host (or the lone `target_url`).
pub fn select_single(target_url: &str) -> Option<Uri> {
    target_url.parse::<Uri>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_cycles_through_hosts() {
        let hosts = vec![
            "http://a.internal".to_string(),
            "http://b.internal".to_string(),
        ];
        let cursor = AtomicUsize::new(0);
        let first = select_round_robin(&hosts, &cursor).unwrap();
        let second = select_round_robin(&hosts, &cursor).unwrap();
        let third = select_round_robin(&hosts, &cursor).unwrap();
        assert_eq!(first.to_string(), "http://a.internal/");
        assert_eq!(second.to_string(), "http://b.internal/");
        assert_eq!(third.to_string(), "http://a.internal/");
    }

    #[test]
    fn empty_host_list_yields_none() {
        let cursor = AtomicUsize::new(0);
        assert!(select_round_robin(&[], &cursor).is_none());
    }
}
