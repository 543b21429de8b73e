use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Future;
use futures::ready;
use http::Response;
use pin_project::pin_project;
use tagcache::Bypass;

/// Future that marks the upstream response with [`Bypass`].
#[pin_project]
pub struct BypassFuture<F> {
    #[pin]
    inner: F,
}

impl<F> BypassFuture<F> {
    pub(crate) fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F, B, E> Future for BypassFuture<F>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = Result<Response<B>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let mut response = ready!(this.inner.poll(cx))?;
        response.extensions_mut().insert(Bypass);
        Poll::Ready(Ok(response))
    }
}
