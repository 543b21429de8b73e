use std::task::{Context, Poll};

use http::{Request, Response};
use tagcache::Bypass;
use tower::{Layer, Service};

use crate::future::BypassFuture;

/// Layer that keeps responses of the wrapped service out of the cache.
///
/// The [`Bypass`] marker is set on the request and on the response, so the
/// layer works both outside and inside a [`CacheLayer`](crate::CacheLayer).
/// Cached responses are still served to bypassed requests; only writes are
/// suppressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct BypassLayer;

impl BypassLayer {
    /// Creates the layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for BypassLayer {
    type Service = BypassService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BypassService { inner }
    }
}

/// Service produced by [`BypassLayer`].
#[derive(Debug, Clone)]
pub struct BypassService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for BypassService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BypassFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        request.extensions_mut().insert(Bypass);
        BypassFuture::new(self.inner.call(request))
    }
}
