use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tagcache_core::{CacheKey, Raw, StoreLabel, TagSet};

use crate::{DeleteStatus, StoreError};

/// Result of a store operation.
pub type StoreResult<T> = Result<T, StoreError>;

/// Uniform interface over a cache storage engine.
///
/// The store works on already serialized payloads; encoding is the job of the
/// repository's [`Format`](crate::Format). Expiry and eviction are the store's
/// concern.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads the payload stored under `key`. A miss, including an expired
    /// entry, is `Ok(None)`.
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<Raw>>;

    /// Checks whether an entry exists. Defaults to a full [`get`](Self::get).
    async fn has(&self, key: &CacheKey) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Writes a payload. `ttl = None` means the store default, which may be
    /// "never expires".
    async fn put(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> StoreResult<()>;

    /// Removes the entry stored under `key`, reporting whether it existed.
    async fn forget(&self, key: &CacheKey) -> StoreResult<DeleteStatus>;

    /// Removes every entry visible through this store.
    ///
    /// On a root store this empties the whole cache, on a tag-scoped view it
    /// flushes the view's tag group.
    async fn clear(&self) -> StoreResult<()>;

    /// Returns the label of this store for logs, metrics and store selection
    /// in configuration.
    fn label(&self) -> StoreLabel {
        StoreLabel::new_static("store")
    }

    /// Tag capability of this store.
    ///
    /// Stores that can scope entries by tag return `Some(self)`. The default
    /// is `None`, in which case callers fall back to the untagged store.
    fn as_taggable(&self) -> Option<&dyn TaggableStore> {
        None
    }
}

/// A store able to produce tag-scoped views of itself.
pub trait TaggableStore: Store {
    /// Returns a view restricted to entries carrying every tag in `tags`.
    ///
    /// Writes through the view attach `tags` to the entry. `clear()` on the
    /// view removes every entry carrying any of `tags`.
    ///
    /// Returns [`StoreError::InvalidTags`] if the store cannot represent the
    /// given tags.
    fn tags(&self, tags: &TagSet) -> StoreResult<Box<dyn Store + '_>>;
}

#[async_trait]
impl Store for &dyn Store {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<Raw>> {
        (*self).get(key).await
    }

    async fn has(&self, key: &CacheKey) -> StoreResult<bool> {
        (*self).has(key).await
    }

    async fn put(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> StoreResult<()> {
        (*self).put(key, value, ttl).await
    }

    async fn forget(&self, key: &CacheKey) -> StoreResult<DeleteStatus> {
        (*self).forget(key).await
    }

    async fn clear(&self) -> StoreResult<()> {
        (*self).clear().await
    }

    fn label(&self) -> StoreLabel {
        (*self).label()
    }

    fn as_taggable(&self) -> Option<&dyn TaggableStore> {
        (*self).as_taggable()
    }
}

#[async_trait]
impl Store for Box<dyn Store + '_> {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<Raw>> {
        (**self).get(key).await
    }

    async fn has(&self, key: &CacheKey) -> StoreResult<bool> {
        (**self).has(key).await
    }

    async fn put(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> StoreResult<()> {
        (**self).put(key, value, ttl).await
    }

    async fn forget(&self, key: &CacheKey) -> StoreResult<DeleteStatus> {
        (**self).forget(key).await
    }

    async fn clear(&self) -> StoreResult<()> {
        (**self).clear().await
    }

    fn label(&self) -> StoreLabel {
        (**self).label()
    }

    fn as_taggable(&self) -> Option<&dyn TaggableStore> {
        (**self).as_taggable()
    }
}

#[async_trait]
impl Store for Arc<dyn Store + 'static> {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<Raw>> {
        (**self).get(key).await
    }

    async fn has(&self, key: &CacheKey) -> StoreResult<bool> {
        (**self).has(key).await
    }

    async fn put(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> StoreResult<()> {
        (**self).put(key, value, ttl).await
    }

    async fn forget(&self, key: &CacheKey) -> StoreResult<DeleteStatus> {
        (**self).forget(key).await
    }

    async fn clear(&self) -> StoreResult<()> {
        (**self).clear().await
    }

    fn label(&self) -> StoreLabel {
        (**self).label()
    }

    fn as_taggable(&self) -> Option<&dyn TaggableStore> {
        (**self).as_taggable()
    }
}
