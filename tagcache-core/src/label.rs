//! Store label type for identifying store adapters.
//!
//! `StoreLabel` is a newtype wrapper around `SmolStr` used in log fields,
//! metric labels and `Debug` output of stores and their tag-scoped views.

use smol_str::SmolStr;
use std::fmt;

/// A label identifying a store adapter.
///
/// # Example
/// ```
/// use tagcache_core::StoreLabel;
///
/// let label = StoreLabel::new("moka");
/// let scoped = label.scoped("tagged");
/// assert_eq!(scoped.as_str(), "moka.tagged");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StoreLabel(SmolStr);

impl StoreLabel {
    /// Creates a new store label.
    #[inline]
    pub fn new(s: impl Into<SmolStr>) -> Self {
        Self(s.into())
    }

    /// Creates a store label from a static string (no allocation).
    #[inline]
    pub const fn new_static(s: &'static str) -> Self {
        Self(SmolStr::new_static(s))
    }

    /// Returns the label as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the label of a sub-view: "self.suffix".
    #[inline]
    pub fn scoped(&self, suffix: &str) -> Self {
        Self(SmolStr::from(format!("{}.{}", self.0, suffix)))
    }
}

impl fmt::Display for StoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for StoreLabel {
    #[inline]
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

impl From<String> for StoreLabel {
    #[inline]
    fn from(s: String) -> Self {
        Self(SmolStr::from(s))
    }
}
