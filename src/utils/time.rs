//! Expiry/time helpers shared by sessions and OAuth tokens (spec.md §3, §4.7).

use chrono::Utc;

/// Whether a Unix-epoch expiry timestamp has passed. `0` means "never
/// expires" (spec.md §3).
pub fn is_expired(expires_at: i64) -> bool {
    expires_at != 0 && expires_at < Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_never_expires() {
        assert!(!is_expired(0));
    }

    #[test]
    fn past_timestamp_is_expired() {
        assert!(is_expired(1));
    }

    #[test]
    fn future_timestamp_is_not_expired() {
        assert!(!is_expired(Utc::now().timestamp() + 3600));
    }
}
