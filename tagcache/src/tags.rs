//! Resolution of `{placeholder}` segments in tag templates.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tagcache_core::{Tag, TagSet};

use crate::http::{FormParams, QueryValue, RequestHead, RouteParams, parse_query};

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{(.+?)\}").expect("placeholder pattern is valid");
}

/// Resolves tag templates against one request.
///
/// A placeholder `{name}` is looked up in the request's route parameters,
/// then its query string, then its form parameters. Placeholders without a
/// usable value stay in the tag literally. Resolved templates are memoised for
/// the lifetime of the resolver only, so two requests never share a result.
pub struct TagResolver<'r> {
    request: &'r RequestHead<'r>,
    query: Option<HashMap<String, QueryValue>>,
    memo: HashMap<Tag, Tag>,
}

impl<'r> TagResolver<'r> {
    /// Creates a resolver for `request`.
    pub fn new(request: &'r RequestHead<'r>) -> Self {
        Self {
            request,
            query: None,
            memo: HashMap::new(),
        }
    }

    /// Resolves every tag of `tags` in order, dropping empty results.
    pub fn resolve_all<I>(&mut self, tags: I) -> TagSet
    where
        I: IntoIterator<Item = Tag>,
    {
        tags.into_iter()
            .filter(|tag| !tag.is_empty())
            .map(|tag| self.resolve(&tag))
            .collect()
    }

    /// Resolves one tag template.
    pub fn resolve(&mut self, tag: &Tag) -> Tag {
        if !tag.is_template() {
            return tag.clone();
        }
        if let Some(resolved) = self.memo.get(tag) {
            return resolved.clone();
        }
        let resolved = Tag::from(
            PLACEHOLDER
                .replace_all(tag.as_str(), |captures: &Captures<'_>| {
                    self.lookup(&captures[1])
                        .unwrap_or_else(|| captures[0].to_owned())
                })
                .as_ref(),
        );
        self.memo.insert(tag.clone(), resolved.clone());
        resolved
    }

    fn lookup(&mut self, name: &str) -> Option<String> {
        if let Some(value) = self
            .request
            .extension::<RouteParams>()
            .and_then(|params| params.get(name))
        {
            return value.as_tag_segment();
        }
        let request = self.request;
        let query = self
            .query
            .get_or_insert_with(|| request.uri().query().map(parse_query).unwrap_or_default());
        if let Some(value) = query.get(name) {
            return value.as_scalar().filter(|v| !v.is_empty()).map(str::to_owned);
        }
        self.request
            .extension::<FormParams>()
            .and_then(|form| form.get(name))
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    }
}
