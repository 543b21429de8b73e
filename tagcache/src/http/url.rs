use http::header::HOST;
use http::uri::{Authority, Scheme};
use http::Uri;

use super::RequestHead;
use crate::error::CacheError;

/// Completes relative URIs against the application's base URL.
///
/// Used to build full request URLs for cache keys and to synthesise requests
/// when deleting cached URIs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlGenerator {
    scheme: Scheme,
    authority: Authority,
}

impl UrlGenerator {
    /// Creates a generator from an absolute base URL such as
    /// `https://example.com`. Any path in the base is ignored.
    pub fn new(base: &str) -> Result<Self, CacheError> {
        let uri: Uri = base.parse().map_err(|_| CacheError::InvalidUri(base.to_owned()))?;
        let parts = uri.into_parts();
        match (parts.scheme, parts.authority) {
            (Some(scheme), Some(authority)) => Ok(Self { scheme, authority }),
            _ => Err(CacheError::InvalidUri(base.to_owned())),
        }
    }

    /// Base scheme.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Base authority.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Returns `uri` unchanged if it is absolute, else completes it against
    /// the base URL.
    pub fn to(&self, uri: &str) -> Result<Uri, CacheError> {
        let invalid = || CacheError::InvalidUri(uri.to_owned());
        if uri.contains("://") {
            return uri.parse().map_err(|_| invalid());
        }
        let path_and_query = if uri.starts_with('/') {
            uri.to_owned()
        } else {
            format!("/{uri}")
        };
        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(|_| invalid())
    }

    /// Builds the normalised full URL of a request.
    ///
    /// Scheme and authority come from the request URI when it is absolute;
    /// otherwise from the `Host` header and this generator. Query pairs are
    /// sorted by name and re-encoded, and a trailing `/` is trimmed, so
    /// equivalent URLs spell the same.
    pub fn full_url(&self, request: &RequestHead<'_>) -> String {
        let uri = request.uri();
        let scheme = uri.scheme_str().unwrap_or(self.scheme.as_str());
        let host = uri
            .authority()
            .map(Authority::as_str)
            .or_else(|| request.headers().get(HOST).and_then(|h| h.to_str().ok()))
            .unwrap_or(self.authority.as_str());
        let path = uri.path().trim_end_matches('/');

        match uri.query().map(normalize_query).filter(|q| !q.is_empty()) {
            Some(query) if path.is_empty() => format!("{scheme}://{host}/?{query}"),
            Some(query) => format!("{scheme}://{host}{path}?{query}"),
            None => format!("{scheme}://{host}{path}"),
        }
    }
}

impl Default for UrlGenerator {
    /// `http://localhost`.
    fn default() -> Self {
        Self {
            scheme: Scheme::HTTP,
            authority: Authority::from_static("localhost"),
        }
    }
}

/// Sorts query pairs by name (stable, so repeated names keep their order)
/// and re-encodes them. Undecodable queries are kept verbatim.
fn normalize_query(query: &str) -> String {
    let Ok(mut pairs) = serde_urlencoded::from_str::<Vec<(String, String)>>(query) else {
        return query.to_owned();
    };
    pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
    serde_urlencoded::to_string(&pairs).unwrap_or_else(|_| query.to_owned())
}
