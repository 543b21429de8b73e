use http::{Extensions, HeaderMap, Method, Request, Uri, request::Parts};

/// Borrowed view of the parts of a request the cache looks at.
///
/// The cache never owns a request. Both `&Request<B>` and `&Parts` convert
/// into a `RequestHead`, so every coordinator operation accepts either.
#[derive(Clone, Copy, Debug)]
pub struct RequestHead<'a> {
    method: &'a Method,
    uri: &'a Uri,
    headers: &'a HeaderMap,
    extensions: &'a Extensions,
}

impl<'a> RequestHead<'a> {
    /// Creates a view from individual request parts.
    pub fn new(
        method: &'a Method,
        uri: &'a Uri,
        headers: &'a HeaderMap,
        extensions: &'a Extensions,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            extensions,
        }
    }

    /// Request method.
    pub fn method(&self) -> &'a Method {
        self.method
    }

    /// Request URI as received, origin-form or absolute.
    pub fn uri(&self) -> &'a Uri {
        self.uri
    }

    /// Request headers.
    pub fn headers(&self) -> &'a HeaderMap {
        self.headers
    }

    /// Returns a typed request extension.
    pub fn extension<T>(&self) -> Option<&'a T>
    where
        T: Send + Sync + Clone + 'static,
    {
        self.extensions.get::<T>()
    }

    /// Returns `true` if an upstream layer marked the request with [`Bypass`].
    pub fn is_bypassed(&self) -> bool {
        self.extension::<Bypass>().is_some()
    }
}

impl<'a, B> From<&'a Request<B>> for RequestHead<'a> {
    fn from(request: &'a Request<B>) -> Self {
        Self::new(
            request.method(),
            request.uri(),
            request.headers(),
            request.extensions(),
        )
    }
}

impl<'a> From<&'a Parts> for RequestHead<'a> {
    fn from(parts: &'a Parts) -> Self {
        Self::new(&parts.method, &parts.uri, &parts.headers, &parts.extensions)
    }
}

/// Request extension that suppresses cache writes for the request.
///
/// Reads are unaffected: a bypassed request can still be served from cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bypass;

/// Request extension carrying the authenticated principal's identifier.
///
/// The default strategy appends it to the request identity, so every
/// principal gets its own cache entry. Absence means "unauthenticated".
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Principal(String);

impl Principal {
    /// Creates a principal from its identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
