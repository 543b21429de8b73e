//! HTTP response cache with tag-based invalidation.
//!
//! Successful responses to idempotent requests are stored under a key derived
//! from the request identity, together with a set of tags. Entries can later
//! be removed one by one or by tag group.
//!
//! - [`ResponseCache`] coordinates everything and is what applications use
//! - [`CacheStrategy`] decides identity, eligibility and base tags
//! - [`Repository`] persists entries through a [`Store`] adapter
//! - [`CacheSettings`] carries the configuration, read on every operation
//!
//! Tags may contain `{placeholder}` segments, filled in from the request's
//! route parameters, query string or form parameters, e.g. `users.{user}`.
//! Store adapters live in their own crates (`tagcache-moka`), the HTTP
//! middleware in `tagcache-tower`.
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// The response cache coordinator.
///
/// [`ResponseCache`] derives keys and tags through a
/// [`CacheStrategy`](strategy::CacheStrategy), annotates stored copies and
/// persists them through a [`Repository`](repository::Repository).
pub mod cache;

/// Error types for cache operations.
pub mod error;

/// Hit, miss and flush notifications.
pub mod events;

/// HTTP request and response types the cache reads and stores.
pub mod http;

/// Metrics-backed cache observer.
///
/// When the `metrics` feature is enabled, this module provides counters for
/// cache hits, misses and flushes.
#[cfg(feature = "metrics")]
#[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
pub mod metrics;

/// Persistence facade over a store adapter.
pub mod repository;

/// Cache settings, runtime overrides and reloadable settings handles.
pub mod settings;

/// Cache strategies: request identity, eligibility and base tags.
pub mod strategy;

/// Tag template resolution.
pub mod tags;

pub use cache::{ResponseCache, ResponseCacheBuilder};
pub use error::CacheError;
pub use events::{CacheEvent, CacheObserver, Observers, TracingObserver};
pub use http::{
    Bypass, CacheStatus, CachedResponse, FormParams, ParamValue, Principal, RequestHead,
    RouteKey, RouteParams, UrlGenerator,
};
pub use repository::Repository;
pub use settings::{CacheSettings, ReloadableSettings, Runtime, SettingsSource};
pub use strategy::{CacheStrategy, DefaultStrategy, HeaderScopedStrategy};

pub use tagcache_backend::{
    BincodeFormat, DeleteStatus, Format, JsonFormat, Store, StoreError, TaggableStore,
};
pub use tagcache_core::{CacheKey, Raw, StoreLabel, Tag, TagSet};
