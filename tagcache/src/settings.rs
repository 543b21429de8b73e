//! Cache settings and the accessors the coordinator reads them through.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tagcache_core::Tag;

use crate::error::CacheError;

/// Response cache settings.
///
/// Every field has a default, so an empty document is valid:
///
/// ```yaml
/// enabled: true
/// ttl: 1day
/// store: moka
/// tags: [responses]
/// server_timing: false
/// cache_status_enabled: true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheSettings {
    /// Whether caching is switched on (see [`Runtime`] for overrides).
    pub enabled: bool,
    /// Default time-to-live of cache entries (e.g. "60s", "1day").
    /// `None` leaves expiry to the store.
    #[serde(with = "humantime_serde")]
    pub ttl: Option<Duration>,
    /// Identifier of the store adapter backing the cache. It must equal the
    /// label of the repository's store; see [`ResponseCacheBuilder::build`].
    ///
    /// [`ResponseCacheBuilder::build`]: crate::cache::ResponseCacheBuilder::build
    pub store: String,
    /// Tags applied to every entry.
    pub tags: Vec<String>,
    /// Add a `Server-Timing` header with the write time to cached responses.
    pub server_timing: bool,
    /// Add a `Response-Cache-Status` header to responses.
    pub cache_status_enabled: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Some(Duration::from_secs(86_400)),
            store: "moka".to_owned(),
            tags: Vec::new(),
            server_timing: false,
            cache_status_enabled: true,
        }
    }
}

impl CacheSettings {
    /// Parses settings from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, CacheError> {
        serde_saphyr::from_str(yaml).map_err(|error| CacheError::Settings(error.to_string()))
    }

    /// The configured default tags.
    pub fn default_tags(&self) -> Vec<Tag> {
        self.tags.iter().map(Tag::from).collect()
    }
}

/// Process environment flags that force the cache on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Runtime {
    /// Running under a test harness.
    pub test_harness: bool,
    /// Running as a console command.
    pub console: bool,
}

impl Runtime {
    /// Effective enabled state for the given settings.
    pub fn enables(&self, settings: &CacheSettings) -> bool {
        settings.enabled || self.test_harness || self.console
    }
}

/// Accessor the coordinator calls on every operation to read settings.
///
/// Wraps a static value, a closure, or a [`ReloadableSettings`] handle, so
/// settings changed at runtime apply without rebuilding the coordinator.
#[derive(Clone)]
pub struct SettingsSource(Arc<dyn Fn() -> Arc<CacheSettings> + Send + Sync>);

impl SettingsSource {
    /// A source that always yields the same settings.
    pub fn fixed(settings: CacheSettings) -> Self {
        let settings = Arc::new(settings);
        Self(Arc::new(move || Arc::clone(&settings)))
    }

    /// A source backed by a closure.
    pub fn from_fn<F>(accessor: F) -> Self
    where
        F: Fn() -> Arc<CacheSettings> + Send + Sync + 'static,
    {
        Self(Arc::new(accessor))
    }

    /// Current settings.
    pub fn current(&self) -> Arc<CacheSettings> {
        (self.0)()
    }
}

impl Default for SettingsSource {
    fn default() -> Self {
        Self::fixed(CacheSettings::default())
    }
}

impl fmt::Debug for SettingsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SettingsSource").field(&self.current()).finish()
    }
}

impl From<CacheSettings> for SettingsSource {
    fn from(settings: CacheSettings) -> Self {
        Self::fixed(settings)
    }
}

impl From<ReloadableSettings> for SettingsSource {
    fn from(handle: ReloadableSettings) -> Self {
        Self::from_fn(move || handle.current())
    }
}

/// Shared, replaceable settings.
///
/// Clones share the same slot: a [`replace`](Self::replace) through any
/// clone is seen by every coordinator reading from it.
#[derive(Debug, Clone, Default)]
pub struct ReloadableSettings(Arc<RwLock<Arc<CacheSettings>>>);

impl ReloadableSettings {
    /// Creates a handle holding `settings`.
    pub fn new(settings: CacheSettings) -> Self {
        Self(Arc::new(RwLock::new(Arc::new(settings))))
    }

    /// Current settings.
    pub fn current(&self) -> Arc<CacheSettings> {
        Arc::clone(&self.0.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Swaps in new settings.
    pub fn replace(&self, settings: CacheSettings) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(settings);
    }
}
