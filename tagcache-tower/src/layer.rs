use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use actix_router::ResourceDef;
use tagcache::ResponseCache;
use tagcache_backend::JsonFormat;
use tagcache_core::Tag;
use tower::Layer;

use crate::service::CacheService;

/// Per-route options shared by every service a layer produces.
#[derive(Debug, Default)]
pub(crate) struct RouteOptions {
    pub(crate) ttl: Option<Duration>,
    pub(crate) tags: Vec<Tag>,
    pub(crate) pattern: Option<ResourceDef>,
}

/// Tower layer caching the responses of the wrapped service.
///
/// Use [`CacheLayer::new`] for a layer without route options, or
/// [`CacheLayer::builder`] to set the TTL, tags and route pattern.
pub struct CacheLayer<St, F = JsonFormat> {
    cache: ResponseCache<St, F>,
    route: Arc<RouteOptions>,
}

impl<St, F> CacheLayer<St, F> {
    /// Creates a layer with no route tags, using the configured TTL.
    pub fn new(cache: ResponseCache<St, F>) -> Self {
        Self {
            cache,
            route: Arc::new(RouteOptions::default()),
        }
    }

    /// Starts building a layer.
    pub fn builder(cache: ResponseCache<St, F>) -> CacheLayerBuilder<St, F> {
        CacheLayerBuilder {
            cache,
            route: RouteOptions::default(),
        }
    }
}

impl<St, F> Clone for CacheLayer<St, F> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            route: Arc::clone(&self.route),
        }
    }
}

impl<St, F> fmt::Debug for CacheLayer<St, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheLayer")
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

impl<S, St, F> Layer<S> for CacheLayer<St, F> {
    type Service = CacheService<S, St, F>;

    fn layer(&self, upstream: S) -> Self::Service {
        CacheService::new(upstream, self.cache.clone(), Arc::clone(&self.route))
    }
}

/// Builder for [`CacheLayer`].
pub struct CacheLayerBuilder<St, F = JsonFormat> {
    cache: ResponseCache<St, F>,
    route: RouteOptions,
}

impl<St, F> CacheLayerBuilder<St, F> {
    /// Time-to-live of responses stored by this layer.
    ///
    /// # Default
    ///
    /// The `ttl` from the cache settings.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.route.ttl = Some(ttl);
        self
    }

    /// Tags attached to responses stored by this layer.
    ///
    /// Tags may contain `{placeholder}` segments; see [`route`](Self::route)
    /// for making path segments available to them.
    pub fn tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Tag>,
    {
        self.route.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Route pattern, e.g. `/users/{user}`.
    ///
    /// Segments captured from the request path are exposed as
    /// [`RouteParams`](tagcache::RouteParams) unless an upstream layer
    /// already provided them.
    pub fn route(mut self, pattern: &str) -> Self {
        self.route.pattern = Some(ResourceDef::new(pattern));
        self
    }

    /// Builds the layer.
    pub fn build(self) -> CacheLayer<St, F> {
        CacheLayer {
            cache: self.cache,
            route: Arc::new(self.route),
        }
    }
}
