//! Tower layer that records whether a connection was TLS-terminated.
//!
//! The scheme a request arrived over is connection state, not request state:
//! a server built on hyper/tower sees only a relative `path-and-query` URI for
//! inbound requests. Wrap the service bound to each listener with this layer,
//! mirroring how a TLS accept loop stamps the peer address into
//! `req.extensions_mut()` before dispatch, so [`Identity`](pike_http::Identity)
//! can resolve the `scheme` token from real connection state.

use std::task::{Context, Poll};

use http::Request;
use pike_http::ConnectionScheme;
use tower::{Layer, Service};

/// A [`tower::Layer`] that stamps [`ConnectionScheme`] onto every request.
///
/// Construct one per listener: `ConnectionSchemeLayer::new(false)` for a
/// plaintext listener, `ConnectionSchemeLayer::new(true)` behind a TLS
/// acceptor.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSchemeLayer {
    is_tls: bool,
}

impl ConnectionSchemeLayer {
    /// Creates a layer that marks every request as arriving over TLS (`true`)
    /// or plaintext (`false`).
    pub fn new(is_tls: bool) -> Self {
        Self { is_tls }
    }
}

impl<S> Layer<S> for ConnectionSchemeLayer {
    type Service = ConnectionSchemeService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ConnectionSchemeService {
            inner,
            is_tls: self.is_tls,
        }
    }
}

/// Service produced by [`ConnectionSchemeLayer`].
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSchemeService<S> {
    inner: S,
    is_tls: bool,
}

impl<S, B> Service<Request<B>> for ConnectionSchemeService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        req.extensions_mut()
            .insert(ConnectionScheme { is_tls: self.is_tls });
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use bytes::Bytes;
    use std::convert::Infallible;
    use tower::{ServiceExt, service_fn};

    #[tokio::test]
    async fn stamps_tls_connection_scheme() {
        let upstream = service_fn(|req: Request<Full<Bytes>>| async move {
            let scheme = req.extensions().get::<ConnectionScheme>().copied();
            Ok::<_, Infallible>(scheme)
        });
        let mut svc = ConnectionSchemeLayer::new(true).layer(upstream);
        let req = Request::builder().uri("/a").body(Full::new(Bytes::new())).unwrap();
        let scheme = svc.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(scheme, Some(ConnectionScheme { is_tls: true }));
    }

    #[tokio::test]
    async fn stamps_plaintext_connection_scheme() {
        let upstream = service_fn(|req: Request<Full<Bytes>>| async move {
            let scheme = req.extensions().get::<ConnectionScheme>().copied();
            Ok::<_, Infallible>(scheme)
        });
        let mut svc = ConnectionSchemeLayer::new(false).layer(upstream);
        let req = Request::builder().uri("/a").body(Full::new(Bytes::new())).unwrap();
        let scheme = svc.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(scheme, Some(ConnectionScheme { is_tls: false }));
    }
}
