//! Tags and tag sets.
//!
//! A [`Tag`] labels a cache entry so that a group of entries can be flushed
//! together. Tags may be templates containing `{name}` placeholders; the
//! response cache substitutes them from request parameters before the tag
//! reaches a store.
//!
//! A [`TagSet`] is the ordered union of tags applied to one entry. It keeps
//! insertion order, drops empty tags and ignores duplicates:
//!
//! ```
//! use tagcache_core::TagSet;
//!
//! let tags: TagSet = ["users", "", "posts", "users"].into_iter().collect();
//! assert_eq!(tags.iter().map(|t| t.as_str()).collect::<Vec<_>>(), ["users", "posts"]);
//! ```

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A label attached to cache entries for group invalidation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(SmolStr);

impl Tag {
    /// Creates a new tag.
    #[inline]
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self(tag.into())
    }

    /// Creates a tag from a static string (no allocation).
    #[inline]
    pub const fn new_static(tag: &'static str) -> Self {
        Self(SmolStr::new_static(tag))
    }

    /// Returns the tag as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty tag, which is never stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the tag contains a `{` and may need placeholder
    /// substitution.
    #[inline]
    pub fn is_template(&self) -> bool {
        self.0.contains('{')
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    #[inline]
    fn from(tag: &str) -> Self {
        Self(SmolStr::new(tag))
    }
}

impl From<String> for Tag {
    #[inline]
    fn from(tag: String) -> Self {
        Self(SmolStr::from(tag))
    }
}

impl From<&String> for Tag {
    #[inline]
    fn from(tag: &String) -> Self {
        Self(SmolStr::new(tag))
    }
}

/// Ordered, duplicate-free set of non-empty tags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(IndexSet<Tag>);

impl TagSet {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self(IndexSet::new())
    }

    /// Appends a tag, keeping the position of its first occurrence.
    ///
    /// Empty tags are dropped. Returns `true` if the tag was added.
    pub fn insert(&mut self, tag: impl Into<Tag>) -> bool {
        let tag = tag.into();
        if tag.is_empty() {
            return false;
        }
        self.0.insert(tag)
    }

    /// Returns `true` if the set contains the tag.
    pub fn contains(&self, tag: &Tag) -> bool {
        self.0.contains(tag)
    }

    /// Returns `true` if every tag of `other` is also in `self`.
    pub fn is_superset(&self, other: &TagSet) -> bool {
        other.iter().all(|tag| self.contains(tag))
    }

    /// Number of tags in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set holds no tags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates tags in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    /// Consumes the set, returning its tags in insertion order.
    pub fn into_vec(self) -> Vec<Tag> {
        self.0.into_iter().collect()
    }
}

impl<T> FromIterator<T> for TagSet
where
    T: Into<Tag>,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = TagSet::new();
        set.extend(iter);
        set
    }
}

impl<T> Extend<T> for TagSet
where
    T: Into<Tag>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for tag in iter {
            self.insert(tag);
        }
    }
}

impl IntoIterator for TagSet {
    type Item = Tag;
    type IntoIter = indexmap::set::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = indexmap::set::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", tag)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(set: &TagSet) -> Vec<&str> {
        set.iter().map(Tag::as_str).collect()
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let set: TagSet = ["b", "a", "c"].into_iter().collect();
        assert_eq!(names(&set), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicates_and_empties_are_dropped() {
        let mut set = TagSet::new();
        assert!(set.insert("users"));
        assert!(!set.insert(""));
        assert!(!set.insert("users"));
        assert!(set.insert(String::from("posts")));
        assert_eq!(names(&set), vec!["users", "posts"]);
    }

    #[test]
    fn test_superset() {
        let wide: TagSet = ["a", "b", "c"].into_iter().collect();
        let narrow: TagSet = ["c", "a"].into_iter().collect();
        assert!(wide.is_superset(&narrow));
        assert!(!narrow.is_superset(&wide));
        assert!(narrow.is_superset(&TagSet::new()));
    }

    #[test]
    fn test_template_detection() {
        assert!(Tag::from("users.{user}").is_template());
        assert!(!Tag::new_static("users").is_template());
    }

    #[test]
    fn test_display() {
        let set: TagSet = ["a", "b"].into_iter().collect();
        assert_eq!(set.to_string(), "a,b");
    }
}
