//! The response cache coordinator.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use http::{HeaderValue, Request};
use tagcache_backend::{Format, JsonFormat, Store};
use tagcache_core::{Tag, TagSet};
use tracing::{debug, trace};

use crate::error::CacheError;
use crate::events::{CacheEvent, CacheObserver};
use crate::http::{
    CacheStatus, CachedResponse, RESPONSE_CACHE_STATUS, RequestHead, SERVER_TIMING, UrlGenerator,
};
use crate::repository::Repository;
use crate::settings::{CacheSettings, Runtime, SettingsSource};
use crate::strategy::{CacheStrategy, DefaultStrategy};
use crate::tags::TagResolver;

/// Coordinates a [`CacheStrategy`] and a [`Repository`] to cache responses.
///
/// Tags used by an operation are the strategy's tags, then the configured
/// default tags, then the tags passed by the caller, with `{placeholder}`
/// segments resolved against the request. Settings are read anew on every
/// call; only the enabled state is fixed when the cache is built.
///
/// ```no_run
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// use http::{Request, StatusCode};
/// use tagcache::{CachedResponse, Repository, ResponseCache, Tag};
/// use tagcache_moka::MokaStore;
///
/// let store = MokaStore::builder().max_entries(10_000).build();
/// let cache = ResponseCache::builder(Repository::new(store)).build()?;
///
/// let request = Request::get("/users/42").body(())?;
/// let tags = [Tag::from("users")];
/// cache
///     .put(&request, &CachedResponse::new(StatusCode::OK, "jane"), &tags, None)
///     .await?;
/// assert!(cache.has(&request, &tags).await?);
///
/// cache.flush(Some(&tags[..])).await?;
/// # Ok(())
/// # }
/// ```
pub struct ResponseCache<St, F = JsonFormat> {
    strategy: Arc<dyn CacheStrategy>,
    repository: Arc<Repository<St, F>>,
    settings: SettingsSource,
    urls: UrlGenerator,
    enabled: bool,
}

impl<St, F> Clone for ResponseCache<St, F> {
    fn clone(&self) -> Self {
        Self {
            strategy: Arc::clone(&self.strategy),
            repository: Arc::clone(&self.repository),
            settings: self.settings.clone(),
            urls: self.urls.clone(),
            enabled: self.enabled,
        }
    }
}

impl<St, F> fmt::Debug for ResponseCache<St, F>
where
    St: Store,
    F: Format,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("repository", &self.repository)
            .field("settings", &self.settings)
            .field("urls", &self.urls)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl<St, F> ResponseCache<St, F>
where
    St: Store,
    F: Format,
{
    /// Starts building a cache over `repository`.
    pub fn builder(repository: Repository<St, F>) -> ResponseCacheBuilder<St, F> {
        ResponseCacheBuilder::new(repository)
    }

    /// Whether caching is enabled. Fixed at construction.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Current settings.
    pub fn settings(&self) -> Arc<CacheSettings> {
        self.settings.current()
    }

    /// The strategy in use.
    pub fn strategy(&self) -> &dyn CacheStrategy {
        self.strategy.as_ref()
    }

    /// The repository in use.
    pub fn repository(&self) -> &Arc<Repository<St, F>> {
        &self.repository
    }

    /// Delivers an event to the repository's observer.
    pub fn notify(&self, event: &CacheEvent) {
        self.repository.observer().notify(event);
    }

    /// Checks whether a response to `request` is cached.
    pub async fn has(
        &self,
        request: impl Into<RequestHead<'_>>,
        tags: &[Tag],
    ) -> Result<bool, CacheError> {
        let request = request.into();
        let settings = self.settings.current();
        let key = self.strategy.key(&request);
        let tags = self.resolve_tags(&request, &settings, tags, None);
        trace!(?key, %tags, "cache lookup");
        self.repository.has(&key, &tags).await
    }

    /// Fetches the cached response to `request`.
    ///
    /// With `cache_status_enabled` set in the current settings the response
    /// carries `Response-Cache-Status: hit`.
    pub async fn get(
        &self,
        request: impl Into<RequestHead<'_>>,
        tags: &[Tag],
    ) -> Result<Option<CachedResponse>, CacheError> {
        let request = request.into();
        let settings = self.settings.current();
        let key = self.strategy.key(&request);
        let tags = self.resolve_tags(&request, &settings, tags, None);
        trace!(?key, %tags, "cache read");
        let mut cached: Option<CachedResponse> = self.repository.get(&key, &tags).await?;
        if settings.cache_status_enabled
            && let Some(response) = cached.as_mut()
        {
            response
                .headers_mut()
                .insert(RESPONSE_CACHE_STATUS, CacheStatus::Hit.header_value());
        }
        Ok(cached)
    }

    /// Caches `response` as the answer to `request`.
    ///
    /// Does nothing for bypassed requests and for responses the strategy
    /// declines. `ttl = None` falls back to the configured TTL, then to the
    /// store default. Annotation headers are added to a copy; `response`
    /// itself is never modified. Only `Server-Timing` is stamped at write
    /// time; the status header is added when the entry is served.
    pub async fn put(
        &self,
        request: impl Into<RequestHead<'_>>,
        response: &CachedResponse,
        tags: &[Tag],
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let request = request.into();
        if request.is_bypassed() {
            debug!(uri = %request.uri(), "bypass marker set, not caching");
            return Ok(());
        }
        if !self.strategy.should_cache(&request, response) {
            debug!(
                method = %request.method(),
                uri = %request.uri(),
                status = %response.status(),
                "response not cacheable"
            );
            return Ok(());
        }

        let settings = self.settings.current();
        let ttl = ttl.or(settings.ttl);
        let key = self.strategy.key(&request);
        let tags = self.resolve_tags(&request, &settings, tags, Some(response));
        let response = annotate(response, &settings);
        debug!(?key, %tags, ?ttl, "caching response");
        self.repository.put(&key, response.as_ref(), &tags, ttl).await
    }

    /// Removes the cached GET responses for `uris`.
    ///
    /// Each URI is completed against the [`UrlGenerator`] and turned into a
    /// bare GET request, so entries whose key depends on anything else
    /// (headers, the principal) are not found. `tags` select the store view
    /// as given, without defaults or placeholder resolution.
    pub async fn delete<U>(&self, uris: &[U], tags: &[Tag]) -> Result<(), CacheError>
    where
        U: AsRef<str>,
    {
        let tags: TagSet = tags.iter().cloned().collect();
        for uri in uris {
            let mut request = Request::new(());
            *request.uri_mut() = self.urls.to(uri.as_ref())?;
            let key = self.strategy.key(&RequestHead::from(&request));
            if self.repository.has(&key, &tags).await? {
                debug!(?key, uri = %request.uri(), "deleting cached response");
                self.repository.delete(&key, &tags).await?;
            }
        }
        Ok(())
    }

    /// Flushes the configured default tags together with `tags`.
    ///
    /// With no default tags and `tags = None` the whole cache is cleared.
    pub async fn flush(&self, tags: Option<&[Tag]>) -> Result<(), CacheError> {
        let settings = self.settings.current();
        let tags: TagSet = settings
            .default_tags()
            .into_iter()
            .chain(tags.unwrap_or_default().iter().cloned())
            .collect();
        self.repository.flush(&tags).await
    }

    fn resolve_tags(
        &self,
        request: &RequestHead<'_>,
        settings: &CacheSettings,
        tags: &[Tag],
        response: Option<&CachedResponse>,
    ) -> TagSet {
        let candidates = self
            .strategy
            .tags(request, response)
            .into_iter()
            .chain(settings.default_tags())
            .chain(tags.iter().cloned());
        TagResolver::new(request).resolve_all(candidates)
    }
}

/// Stamps the write time into a copy of `response` when `server_timing` is
/// set.
fn annotate<'a>(response: &'a CachedResponse, settings: &CacheSettings) -> Cow<'a, CachedResponse> {
    if !settings.server_timing {
        return Cow::Borrowed(response);
    }
    let mut annotated = response.clone();
    let timing = format!("response-cache;desc=\"{}\"", Utc::now().to_rfc2822());
    if let Ok(value) = HeaderValue::from_str(&timing) {
        annotated.headers_mut().insert(SERVER_TIMING, value);
    }
    Cow::Owned(annotated)
}

/// Builder for [`ResponseCache`].
pub struct ResponseCacheBuilder<St, F = JsonFormat> {
    repository: Repository<St, F>,
    strategy: Option<Arc<dyn CacheStrategy>>,
    settings: SettingsSource,
    urls: UrlGenerator,
    runtime: Runtime,
}

impl<St, F> ResponseCacheBuilder<St, F>
where
    St: Store,
    F: Format,
{
    /// Creates a builder with default settings and strategy.
    pub fn new(repository: Repository<St, F>) -> Self {
        Self {
            repository,
            strategy: None,
            settings: SettingsSource::default(),
            urls: UrlGenerator::default(),
            runtime: Runtime::default(),
        }
    }

    /// Sets the strategy.
    ///
    /// # Default
    ///
    /// [`DefaultStrategy`] using this builder's URL generator.
    pub fn strategy(mut self, strategy: impl CacheStrategy + 'static) -> Self {
        self.strategy = Some(Arc::new(strategy));
        self
    }

    /// Sets where settings are read from.
    pub fn settings(mut self, settings: impl Into<SettingsSource>) -> Self {
        self.settings = settings.into();
        self
    }

    /// Sets the base URL for relative URIs.
    ///
    /// # Default
    ///
    /// `http://localhost`
    pub fn url_generator(mut self, urls: UrlGenerator) -> Self {
        self.urls = urls;
        self
    }

    /// Sets the runtime flags that force caching on.
    pub fn runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = runtime;
        self
    }

    /// Builds the cache, fixing its enabled state.
    ///
    /// Fails with [`CacheError::StoreMismatch`] when the `store` named in the
    /// settings is not the label of the repository's store.
    pub fn build(self) -> Result<ResponseCache<St, F>, CacheError> {
        let settings = self.settings.current();
        let label = self.repository.store().label();
        if settings.store != label.as_str() {
            return Err(CacheError::StoreMismatch {
                configured: settings.store.clone(),
                actual: label.to_string(),
            });
        }

        let enabled = self.runtime.enables(&settings);
        let strategy = self.strategy.unwrap_or_else(|| {
            Arc::new(DefaultStrategy::new().with_url_generator(self.urls.clone()))
        });
        debug!(enabled, store = %label, runtime = ?self.runtime, "response cache built");
        Ok(ResponseCache {
            strategy,
            repository: Arc::new(self.repository),
            settings: self.settings,
            urls: self.urls,
            enabled,
        })
    }
}
