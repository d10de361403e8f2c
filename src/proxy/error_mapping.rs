//! Error mapping (spec.md §4.2 step 9): translates round-trip failures into
//! the client-facing error taxonomy of spec.md §7.

use crate::errors::GatewayError;
use crate::proxy::circuit_breaker::CircuitBreakerError;
use hyper_util::client::legacy::Error as LegacyClientError;

/// Map a `hyper-util` legacy client error to the gateway's error taxonomy.
/// Connect-phase failures (refused, unreachable, DNS) surface as
/// `UpstreamUnreachable`; anything else (protocol violations, body errors)
/// as an internal error, per spec.md §7's "everything that is not an
/// explicit timeout or connect failure is a 500".
pub fn map_client_error(error: LegacyClientError) -> GatewayError {
    if error.is_connect() {
        GatewayError::UpstreamUnreachable(error.to_string())
    } else {
        GatewayError::Internal(error.to_string())
    }
}

pub fn map_circuit_breaker_error(error: CircuitBreakerError, endpoint: &str) -> GatewayError {
    match error {
        CircuitBreakerError::CircuitOpen => GatewayError::CircuitOpen {
            endpoint: endpoint.to_string(),
        },
        CircuitBreakerError::ServiceError(message) => GatewayError::UpstreamUnreachable(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuit_open_maps_to_circuit_open_variant() {
        let mapped = map_circuit_breaker_error(CircuitBreakerError::CircuitOpen, "api-1:/foo");
        assert!(matches!(mapped, GatewayError::CircuitOpen { endpoint } if endpoint == "api-1:/foo"));
    }
}
