//! Cache strategies: request identity, eligibility and base tags.

use std::sync::Arc;

use http::{HeaderName, Method};
use tagcache_core::{CacheKey, Tag};

use crate::http::{CachedResponse, Principal, RequestHead, UrlGenerator};

/// Policy deciding what is cached, under which key, with which tags.
///
/// Implement it to customise caching; the coordinator takes any strategy by
/// composition. Strategy methods never fail.
pub trait CacheStrategy: Send + Sync {
    /// Unhashed identity of a request: everything that must differ for two
    /// requests to get distinct cache entries.
    fn fingerprint(&self, request: &RequestHead<'_>) -> String;

    /// Cache key of a request. Deterministic, with no time or randomness
    /// involved.
    fn key(&self, request: &RequestHead<'_>) -> CacheKey {
        CacheKey::from_fingerprint(&self.fingerprint(request))
    }

    /// Whether the response to the request may be cached.
    ///
    /// Defaults to GET or HEAD requests with a 2xx or 3xx response.
    fn should_cache(&self, request: &RequestHead<'_>, response: &CachedResponse) -> bool {
        is_method_cacheable(request.method()) && is_status_cacheable(response)
    }

    /// Base tags of an entry. `response` is `None` on lookup and populated on
    /// write, so response-dependent tags only apply when storing.
    fn tags(&self, request: &RequestHead<'_>, response: Option<&CachedResponse>) -> Vec<Tag>;
}

/// Returns `true` for methods whose responses may be cached.
pub fn is_method_cacheable(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

fn is_status_cacheable(response: &CachedResponse) -> bool {
    let status = response.status();
    status.is_success() || status.is_redirection()
}

impl<T> CacheStrategy for Arc<T>
where
    T: CacheStrategy + ?Sized,
{
    fn fingerprint(&self, request: &RequestHead<'_>) -> String {
        (**self).fingerprint(request)
    }

    fn key(&self, request: &RequestHead<'_>) -> CacheKey {
        (**self).key(request)
    }

    fn should_cache(&self, request: &RequestHead<'_>, response: &CachedResponse) -> bool {
        (**self).should_cache(request, response)
    }

    fn tags(&self, request: &RequestHead<'_>, response: Option<&CachedResponse>) -> Vec<Tag> {
        (**self).tags(request, response)
    }
}

impl<T> CacheStrategy for Box<T>
where
    T: CacheStrategy + ?Sized,
{
    fn fingerprint(&self, request: &RequestHead<'_>) -> String {
        (**self).fingerprint(request)
    }

    fn key(&self, request: &RequestHead<'_>) -> CacheKey {
        (**self).key(request)
    }

    fn should_cache(&self, request: &RequestHead<'_>, response: &CachedResponse) -> bool {
        (**self).should_cache(request, response)
    }

    fn tags(&self, request: &RequestHead<'_>, response: Option<&CachedResponse>) -> Vec<Tag> {
        (**self).tags(request, response)
    }
}

/// Identity is the method followed by the normalised full URL, suffixed with
/// the [`Principal`] when the request carries one.
///
/// Its base tags are the ones given to [`with_tags`](Self::with_tags), empty
/// by default. They are separate from [`CacheSettings::tags`]: the
/// coordinator appends the configured default tags after the strategy's on
/// every operation, so they must not be repeated here.
///
/// [`CacheSettings::tags`]: crate::settings::CacheSettings::tags
#[derive(Debug, Clone, Default)]
pub struct DefaultStrategy {
    tags: Vec<Tag>,
    urls: UrlGenerator,
}

impl DefaultStrategy {
    /// Creates a strategy with no base tags, completing origin-form URIs
    /// against `http://localhost`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Base tags returned for every request, in addition to the configured
    /// default tags.
    pub fn with_tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Tag>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Base URL used to complete origin-form request URIs.
    pub fn with_url_generator(mut self, urls: UrlGenerator) -> Self {
        self.urls = urls;
        self
    }
}

impl CacheStrategy for DefaultStrategy {
    fn fingerprint(&self, request: &RequestHead<'_>) -> String {
        let suffix = request
            .extension::<Principal>()
            .map(Principal::as_str)
            .unwrap_or_default();
        format!(
            "{}{}{}",
            request.method(),
            self.urls.full_url(request),
            suffix
        )
    }

    fn tags(&self, _request: &RequestHead<'_>, _response: Option<&CachedResponse>) -> Vec<Tag> {
        self.tags.clone()
    }
}

/// Decorator scoping entries by request header values.
///
/// Appends the values of the configured headers to the inner strategy's
/// fingerprint, so e.g. each `Accept-Language` gets its own entry.
/// Eligibility and tags are delegated.
#[derive(Debug, Clone)]
pub struct HeaderScopedStrategy<S> {
    inner: S,
    headers: Vec<HeaderName>,
}

impl<S> HeaderScopedStrategy<S> {
    /// Wraps `inner`, varying on `headers`.
    pub fn new(inner: S, headers: impl IntoIterator<Item = HeaderName>) -> Self {
        Self {
            inner,
            headers: headers.into_iter().collect(),
        }
    }
}

impl<S> CacheStrategy for HeaderScopedStrategy<S>
where
    S: CacheStrategy,
{
    fn fingerprint(&self, request: &RequestHead<'_>) -> String {
        let mut fingerprint = self.inner.fingerprint(request);
        for name in &self.headers {
            fingerprint.push('\n');
            fingerprint.push_str(name.as_str());
            fingerprint.push(':');
            let values = request.headers().get_all(name);
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    fingerprint.push(',');
                }
                fingerprint.push_str(&String::from_utf8_lossy(value.as_bytes()));
            }
        }
        fingerprint
    }

    fn should_cache(&self, request: &RequestHead<'_>, response: &CachedResponse) -> bool {
        self.inner.should_cache(request, response)
    }

    fn tags(&self, request: &RequestHead<'_>, response: Option<&CachedResponse>) -> Vec<Tag> {
        self.inner.tags(request, response)
    }
}
