//! HTTP types the cache works with.
//!
//! The cache is framework agnostic: it reads requests through a borrowed
//! [`RequestHead`] and stores fully buffered [`CachedResponse`]s. Upstream
//! layers communicate with it through request extensions: [`Bypass`],
//! [`Principal`], [`RouteParams`] and [`FormParams`].

mod params;
mod request;
mod response;
mod url;

use http::{HeaderName, HeaderValue};

pub use params::{FormParams, ParamValue, RouteKey, RouteParams};
pub(crate) use params::{QueryValue, parse_query};
pub use request::{Bypass, Principal, RequestHead};
pub use response::CachedResponse;
pub use url::UrlGenerator;

/// `Server-Timing` header recording when a response was written to cache.
pub const SERVER_TIMING: HeaderName = HeaderName::from_static("server-timing");

/// Header telling clients whether a response was served from cache.
pub const RESPONSE_CACHE_STATUS: HeaderName = HeaderName::from_static("response-cache-status");

/// Whether a response was served from cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from cache.
    Hit,
    /// Produced by the upstream handler.
    Miss,
}

impl CacheStatus {
    /// Returns the status as a lowercase string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }

    /// Value of the [`RESPONSE_CACHE_STATUS`] header.
    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}
