//! Tower middleware for the tagcache response cache.
//!
//! [`CacheLayer`] wraps any Tower HTTP service: responses to cacheable
//! requests are stored through a [`ResponseCache`](tagcache::ResponseCache)
//! and served from it on subsequent requests. [`BypassLayer`] marks routes
//! whose responses must never be stored.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use bytes::Bytes;
//! use http_body_util::Full;
//! use tagcache::{Repository, ResponseCache};
//! use tagcache_moka::MokaStore;
//! use tagcache_tower::CacheLayer;
//! use tower::{ServiceBuilder, service_fn};
//!
//! # fn main() -> Result<(), tagcache::CacheError> {
//! let store = MokaStore::builder().max_entries(10_000).build();
//! let cache = ResponseCache::builder(Repository::new(store)).build()?;
//!
//! let service = ServiceBuilder::new()
//!     .layer(
//!         CacheLayer::builder(cache)
//!             .route("/users/{user}")
//!             .tags(["users", "users.{user}"])
//!             .ttl(Duration::from_secs(300))
//!             .build(),
//!     )
//!     .service(service_fn(|_req: http::Request<()>| async {
//!         Ok::<_, std::convert::Infallible>(http::Response::new(Full::new(Bytes::from("jane"))))
//!     }));
//! # let _ = service;
//! # Ok(())
//! # }
//! ```
//!
//! # Response headers
//!
//! With `cache_status_enabled` set, responses produced upstream carry
//! `Response-Cache-Status: miss` and responses served from cache carry
//! `Response-Cache-Status: hit`. Cached responses also carry `Server-Timing`
//! when `server_timing` is set.
//!
//! # Bodies
//!
//! Response bodies are buffered in full before they are stored, and every
//! response leaves the middleware as `Full<Bytes>`.

#![warn(missing_docs)]

/// Request and response marking for bypassed routes.
pub mod bypass;
/// Future types for the bypass service.
pub mod future;
/// Tower layer and builder for cache configuration.
pub mod layer;
/// The Tower service implementation that performs caching.
pub mod service;

pub use bypass::{BypassLayer, BypassService};
pub use layer::{CacheLayer, CacheLayerBuilder};
pub use service::{BoxError, CacheService};
