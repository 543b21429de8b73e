//! Request parameters used to resolve `{placeholder}` segments in tags.
//!
//! Three sources are consulted, in order: route parameters bound by the
//! router ([`RouteParams`]), the query string, and a form body captured by
//! the application ([`FormParams`]).

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use actix_router::ResourceDef;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

/// A domain object that has a canonical representation in URLs.
///
/// A bound route parameter implementing this trait contributes its route key
/// to a tag, not a generic rendering of the object.
pub trait RouteKey: Debug + Send + Sync {
    /// The value identifying the object in a route, usually its ID or slug.
    fn route_key(&self) -> String;
}

/// Value of a bound route parameter.
#[derive(Clone, Debug)]
pub enum ParamValue {
    /// A plain string value.
    Scalar(String),
    /// A bound domain object.
    Routable(Arc<dyn RouteKey>),
    /// A list value; it cannot be substituted into a tag.
    List(Vec<String>),
}

impl ParamValue {
    /// Wraps a domain object.
    pub fn routable(value: impl RouteKey + 'static) -> Self {
        Self::Routable(Arc::new(value))
    }

    /// Returns the string this value contributes to a tag, if any.
    ///
    /// Lists and empty strings contribute nothing.
    pub fn as_tag_segment(&self) -> Option<String> {
        let segment = match self {
            Self::Scalar(value) => value.clone(),
            Self::Routable(value) => value.route_key(),
            Self::List(_) => return None,
        };
        (!segment.is_empty()).then_some(segment)
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_owned())
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Request extension holding route parameters bound by the router.
#[derive(Clone, Debug, Default)]
pub struct RouteParams(IndexMap<String, ParamValue>);

impl RouteParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a parameter, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Captures the named segments of `path` against an actix-router pattern.
    ///
    /// Returns `None` when the path does not match the pattern.
    ///
    /// ```
    /// use actix_router::ResourceDef;
    /// use tagcache::http::RouteParams;
    ///
    /// let pattern = ResourceDef::new("/users/{user}/posts/{post}");
    /// let params = RouteParams::capture(&pattern, "/users/42/posts/7").unwrap();
    /// assert_eq!(params.len(), 2);
    /// ```
    pub fn capture(pattern: &ResourceDef, path: &str) -> Option<Self> {
        let mut matched = actix_router::Path::new(path);
        if !pattern.capture_match_info(&mut matched) {
            return None;
        }
        Some(
            matched
                .iter()
                .map(|(name, value)| (name.to_owned(), ParamValue::from(value)))
                .collect(),
        )
    }
}

impl<K, V> FromIterator<(K, V)> for RouteParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// Request extension holding the fields of an urlencoded form body.
///
/// The cache never reads request bodies itself; an application that wants
/// form fields to feed tag placeholders decodes the body and inserts this.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormParams(HashMap<String, String>);

impl FormParams {
    /// Decodes an `application/x-www-form-urlencoded` body.
    ///
    /// Malformed input yields an empty set. Repeated fields keep the last
    /// value.
    pub fn from_urlencoded(body: &[u8]) -> Self {
        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
            Ok(pairs) => Self(pairs.into_iter().collect()),
            Err(error) => {
                debug!(%error, "ignoring malformed form body");
                Self::default()
            }
        }
    }

    /// Returns the field value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for FormParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// A decoded query-string value.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub(crate) enum QueryValue {
    Scalar(String),
    Array(Vec<String>),
    Nested(HashMap<String, QueryValue>),
}

impl QueryValue {
    pub(crate) fn as_scalar(&self) -> Option<&str> {
        match self {
            QueryValue::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

/// Decodes a query string with bracket syntax for arrays and maps.
///
/// A query that cannot be decoded yields no parameters.
pub(crate) fn parse_query(query: &str) -> HashMap<String, QueryValue> {
    serde_qs::Config::new(5, false)
        .deserialize_str(query)
        .unwrap_or_else(|error| {
            debug!(%error, "ignoring undecodable query string");
            HashMap::new()
        })
}
