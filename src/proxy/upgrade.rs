//! Protocol upgrade (spec.md §4.2 step 8): once the upstream responds
//! `101 Switching Protocols`, the proxy stops framing HTTP and splices the
//! client and upstream connections byte-for-byte, as a WebSocket or h2c
//! tunnel requires.

use hyper::upgrade::Upgraded;
use hyper_util::rt::TokioIo;
use tokio::io;

/// Copy bytes in both directions between the hijacked client connection and
/// the hijacked upstream connection until either side closes.
pub async fn splice(client: Upgraded, upstream: Upgraded) -> io::Result<(u64, u64)> {
    let mut client_io = TokioIo::new(client);
    let mut upstream_io = TokioIo::new(upstream);
    io::copy_bidirectional(&mut client_io, &mut upstream_io).await
}

/// True when the upstream's response status indicates a protocol switch
/// that requires splicing rather than ordinary buffered copy (spec.md §4.2
/// step 8).
pub fn is_upgrade_response(status: http::StatusCode) -> bool {
    status == http::StatusCode::SWITCHING_PROTOCOLS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switching_protocols_is_recognized() {
        assert!(is_upgrade_response(http::StatusCode::SWITCHING_PROTOCOLS));
        assert!(!is_upgrade_response(http::StatusCode::OK));
    }
}
