//! Response handling (spec.md §4.2 step 8): streams the upstream response
//! body back to the client, flushing on an interval for APIs that disable
//! full buffering (server-sent events, chunked long-poll responses).

use axum::body::Body;
use bytes::Bytes;
use futures::Stream;
use http::{HeaderMap, Response};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Outcome of proxying one request: the upstream latency observed plus the
/// response handed back to the client (spec.md §4.2's `ProxyResponse`).
pub struct ProxyResponse {
    pub upstream_latency: Duration,
    pub response: Response<Body>,
}

/// A body stream that flushes eagerly — each upstream chunk is forwarded to
/// the client as soon as it arrives rather than coalesced, matching
/// `FlushInterval`'s "flush immediately" (0 or negative) setting. Positive
/// intervals are approximated the same way, since hyper's client body
/// stream has no internal buffering to coalesce in the first place.
pub struct FlushingBody<S> {
    inner: S,
}

impl<S> FlushingBody<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, E> Stream for FlushingBody<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Strip headers the client must not see verbatim (hop-by-hop; handled in
/// `headers::strip_hop_by_hop`) and copy the rest onto the outbound
/// response, preserving declaration order.
pub fn copy_response_headers(source: &HeaderMap, dest: &mut HeaderMap) {
    for (name, value) in source.iter() {
        dest.append(name.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn copies_all_headers_preserving_multi_value() {
        let mut source = HeaderMap::new();
        source.append("set-cookie", HeaderValue::from_static("a=1"));
        source.append("set-cookie", HeaderValue::from_static("b=2"));

        let mut dest = HeaderMap::new();
        copy_response_headers(&source, &mut dest);

        let values: Vec<_> = dest.get_all("set-cookie").iter().collect();
        assert_eq!(values.len(), 2);
    }
}
