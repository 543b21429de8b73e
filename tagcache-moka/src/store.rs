//! Moka store implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tagcache_backend::{DeleteStatus, Store, StoreError, StoreResult, TaggableStore};
use tagcache_core::{CacheKey, Raw, StoreLabel, TagSet};
use tracing::debug;

use crate::builder::{MokaStoreBuilder, NoCapacity};
use crate::entry::Entry;
use crate::index::TagIndex;

/// In-memory, tag-aware store powered by Moka.
///
/// Every entry remembers the tags it was written under, and a reverse index
/// maps each tag to its keys. A view obtained with [`TaggableStore::tags`]
/// reads only entries carrying all of the view's tags, and clearing the view
/// removes every entry carrying any of them.
///
/// # Caveats
///
/// - Data is **not persisted** and **not shared** across processes
/// - Expiration is **best-effort**: expired entries may briefly linger until
///   Moka's maintenance runs, but they are never returned by reads
/// - A write racing a tag flush may survive the flush
#[derive(Clone)]
pub struct MokaStore {
    pub(crate) cache: Cache<CacheKey, Entry>,
    pub(crate) index: Arc<TagIndex>,
    pub(crate) label: StoreLabel,
    pub(crate) default_ttl: Option<Duration>,
    pub(crate) taggable: bool,
}

impl std::fmt::Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("label", &self.label)
            .field("entries", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .field("taggable", &self.taggable)
            .finish()
    }
}

impl MokaStore {
    /// Creates a new builder for `MokaStore`.
    pub fn builder() -> MokaStoreBuilder<NoCapacity> {
        MokaStoreBuilder::new()
    }

    /// Number of live entries, as last reported by Moka.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs Moka's pending maintenance (expiry, eviction, listeners).
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }

    fn validate(&self, tags: &TagSet) -> StoreResult<()> {
        let invalid = tags
            .iter()
            .find(|tag| tag.as_str().chars().any(char::is_control));
        match invalid {
            Some(tag) => Err(StoreError::InvalidTags {
                store: self.label.to_string(),
                tags: tags.to_string(),
                reason: format!("tag {:?} contains control characters", tag.as_str()),
            }),
            None => Ok(()),
        }
    }

    async fn lookup(&self, key: &CacheKey, scope: &TagSet) -> Option<Entry> {
        self.cache
            .get(key)
            .await
            .filter(|entry| entry.tags.is_superset(scope))
    }

    async fn write(&self, key: &CacheKey, data: Raw, tags: Arc<TagSet>, ttl: Option<Duration>) {
        let entry = Entry::new(data, tags, ttl.or(self.default_ttl));
        if let Some(previous) = self.cache.get(key).await {
            self.index.unlink(key, &previous.tags, previous.generation);
        }
        self.index.link(key, &entry.tags, entry.generation);
        self.cache.insert(key.clone(), entry).await;

        #[cfg(feature = "metrics")]
        crate::metrics::record_capacity(
            self.label.as_str(),
            self.cache.entry_count(),
            self.cache.weighted_size(),
        );
    }

    async fn remove(&self, key: &CacheKey, scope: &TagSet) -> DeleteStatus {
        if self.lookup(key, scope).await.is_none() {
            return DeleteStatus::Missing;
        }
        match self.cache.remove(key).await {
            Some(entry) => {
                self.index.unlink(key, &entry.tags, entry.generation);
                DeleteStatus::Deleted(1)
            }
            None => DeleteStatus::Missing,
        }
    }
}

#[async_trait]
impl Store for MokaStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<Raw>> {
        Ok(self.cache.get(key).await.map(|entry| entry.data))
    }

    async fn put(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> StoreResult<()> {
        self.write(key, value, Arc::new(TagSet::new()), ttl).await;
        Ok(())
    }

    async fn forget(&self, key: &CacheKey) -> StoreResult<DeleteStatus> {
        Ok(self.remove(key, &TagSet::new()).await)
    }

    async fn clear(&self) -> StoreResult<()> {
        self.index.clear();
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    fn label(&self) -> StoreLabel {
        self.label.clone()
    }

    fn as_taggable(&self) -> Option<&dyn TaggableStore> {
        self.taggable.then_some(self as &dyn TaggableStore)
    }
}

impl TaggableStore for MokaStore {
    fn tags(&self, tags: &TagSet) -> StoreResult<Box<dyn Store + '_>> {
        self.validate(tags)?;
        Ok(Box::new(TaggedView {
            store: self,
            tags: Arc::new(tags.clone()),
        }))
    }
}

/// A [`MokaStore`] restricted to one tag set.
struct TaggedView<'a> {
    store: &'a MokaStore,
    tags: Arc<TagSet>,
}

#[async_trait]
impl Store for TaggedView<'_> {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<Raw>> {
        Ok(self
            .store
            .lookup(key, &self.tags)
            .await
            .map(|entry| entry.data))
    }

    async fn put(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> StoreResult<()> {
        self.store
            .write(key, value, Arc::clone(&self.tags), ttl)
            .await;
        Ok(())
    }

    async fn forget(&self, key: &CacheKey) -> StoreResult<DeleteStatus> {
        Ok(self.store.remove(key, &self.tags).await)
    }

    async fn clear(&self) -> StoreResult<()> {
        let keys = self.store.index.drain(&self.tags);
        debug!(tags = %self.tags, count = keys.len(), "flushing tag group");
        for key in keys {
            self.store.cache.invalidate(&key).await;
        }
        Ok(())
    }

    fn label(&self) -> StoreLabel {
        self.store.label.scoped("tagged")
    }
}
