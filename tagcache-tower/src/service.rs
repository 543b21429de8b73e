use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response, response::Parts};
use http_body::Body;
use http_body_util::{BodyExt, Full};
use tagcache::http::RESPONSE_CACHE_STATUS;
use tagcache::{
    Bypass, CacheEvent, CacheStatus, CachedResponse, RequestHead, ResponseCache, RouteParams,
};
use tagcache_backend::{Format, Store};
use tagcache_core::Tag;
use tower::Service;
use tracing::{debug, trace, warn};

use crate::layer::RouteOptions;

/// Error type of [`CacheService`]: upstream and body errors, boxed.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Tower service answering from cache and storing upstream responses.
///
/// Store failures never fail a request: they are logged and the request is
/// handled as a miss.
pub struct CacheService<S, St, F> {
    upstream: S,
    cache: ResponseCache<St, F>,
    route: Arc<RouteOptions>,
}

impl<S, St, F> CacheService<S, St, F> {
    pub(crate) fn new(upstream: S, cache: ResponseCache<St, F>, route: Arc<RouteOptions>) -> Self {
        CacheService {
            upstream,
            cache,
            route,
        }
    }
}

impl<S, St, F> Clone for CacheService<S, St, F>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            cache: self.cache.clone(),
            route: Arc::clone(&self.route),
        }
    }
}

impl<S, St, F> fmt::Debug for CacheService<S, St, F>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheService")
            .field("upstream", &self.upstream)
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

impl<S, St, F, ReqBody, ResBody> Service<Request<ReqBody>> for CacheService<S, St, F>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
    St: Store + 'static,
    F: Format + 'static,
    ReqBody: Send + 'static,
    ResBody: Body + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<Full<Bytes>>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.upstream.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        // the ready service handles this call, its clone the next one
        let clone = self.upstream.clone();
        let mut upstream = std::mem::replace(&mut self.upstream, clone);
        let cache = self.cache.clone();
        let route = Arc::clone(&self.route);

        Box::pin(async move {
            if !cache.enabled() {
                trace!(uri = %request.uri(), "response cache disabled");
                let response = upstream.call(request).await.map_err(Into::into)?;
                let (parts, body) = buffer(response).await?;
                return Ok(Response::from_parts(parts, Full::new(body)));
            }

            if let Some(pattern) = &route.pattern
                && request.extensions().get::<RouteParams>().is_none()
                && let Some(params) = RouteParams::capture(pattern, request.uri().path())
            {
                request.extensions_mut().insert(params);
            }

            let mut head = snapshot(&request);
            if let Some(cached) = lookup(&cache, &head, &route.tags).await {
                cache.notify(&CacheEvent::hit(&RequestHead::from(&head)));
                return Ok(cached.into_response());
            }

            let response = upstream.call(request).await.map_err(Into::into)?;
            let (mut parts, body) = buffer(response).await?;
            cache.notify(&CacheEvent::miss(&RequestHead::from(&head)));

            if parts.extensions.get::<Bypass>().is_some() {
                head.extensions_mut().insert(Bypass);
            }
            let stored = CachedResponse::from_head(&parts, body.clone());
            if let Err(error) = cache.put(&head, &stored, &route.tags, route.ttl).await {
                warn!(%error, uri = %head.uri(), "failed to store response");
            }

            if cache.settings().cache_status_enabled {
                parts
                    .headers
                    .insert(RESPONSE_CACHE_STATUS, CacheStatus::Miss.header_value());
            }
            Ok(Response::from_parts(parts, Full::new(body)))
        })
    }
}

/// Copies the request head so it outlives the request handed upstream.
fn snapshot<B>(request: &Request<B>) -> Request<()> {
    let mut head = Request::new(());
    *head.method_mut() = request.method().clone();
    *head.uri_mut() = request.uri().clone();
    *head.version_mut() = request.version();
    *head.headers_mut() = request.headers().clone();
    *head.extensions_mut() = request.extensions().clone();
    head
}

async fn lookup<St, F>(
    cache: &ResponseCache<St, F>,
    head: &Request<()>,
    tags: &[Tag],
) -> Option<CachedResponse>
where
    St: Store,
    F: Format,
{
    match cache.has(head, tags).await {
        Ok(true) => {}
        Ok(false) => return None,
        Err(error) => {
            warn!(%error, uri = %head.uri(), "cache lookup failed, treating as miss");
            return None;
        }
    }
    match cache.get(head, tags).await {
        Ok(Some(cached)) => Some(cached),
        Ok(None) => {
            debug!(uri = %head.uri(), "entry vanished between lookup and read");
            None
        }
        Err(error) => {
            warn!(%error, uri = %head.uri(), "cache read failed, treating as miss");
            None
        }
    }
}

async fn buffer<B>(response: Response<B>) -> Result<(Parts, Bytes), BoxError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let (parts, body) = response.into_parts();
    let body = body.collect().await.map_err(Into::into)?.to_bytes();
    Ok((parts, body))
}
