//! Persistence facade over a store adapter.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tagcache_backend::{DeleteStatus, Format, JsonFormat, Store, StoreError, StoreResult};
use tagcache_core::{CacheKey, TagSet};
use tracing::{debug, trace};

use crate::error::CacheError;
use crate::events::{CacheEvent, CacheObserver, TracingObserver};

/// Reads and writes cache entries for a (key, tag set) pair.
///
/// Every operation first picks the store view: the tag-scoped view when the
/// store is tag capable and tags were given, the root store otherwise. Tags
/// passed to an untagged store are ignored for scoping but still reported in
/// flush events.
///
/// Payloads go through the [`Format`] `F` on the way in and out; a payload
/// that cannot be decoded is an error, never a miss.
pub struct Repository<St, F = JsonFormat> {
    store: Arc<St>,
    format: F,
    observer: Arc<dyn CacheObserver>,
}

impl<St> Repository<St, JsonFormat>
where
    St: Store,
{
    /// Creates a repository storing JSON payloads.
    pub fn new(store: St) -> Self {
        Self::from_arc(Arc::new(store))
    }

    /// Creates a repository over a shared store.
    pub fn from_arc(store: Arc<St>) -> Self {
        Self {
            store,
            format: JsonFormat,
            observer: Arc::new(TracingObserver),
        }
    }
}

impl<St, F> Repository<St, F>
where
    St: Store,
    F: Format,
{
    /// Replaces the payload format.
    pub fn with_format<NF: Format>(self, format: NF) -> Repository<St, NF> {
        Repository {
            store: self.store,
            format,
            observer: self.observer,
        }
    }

    /// Replaces the event observer.
    pub fn with_observer(mut self, observer: impl CacheObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<St> {
        &self.store
    }

    /// The observer events are delivered to.
    pub fn observer(&self) -> &dyn CacheObserver {
        self.observer.as_ref()
    }

    fn scope(&self, tags: &TagSet) -> StoreResult<Box<dyn Store + '_>> {
        let root = self.store.as_ref() as &dyn Store;
        if tags.is_empty() {
            return Ok(Box::new(root));
        }
        match self.store.as_taggable() {
            Some(taggable) => taggable.tags(tags),
            None => {
                debug!(
                    store = %self.store.label(),
                    %tags,
                    "store is not tag capable, using root scope"
                );
                Ok(Box::new(root))
            }
        }
    }

    /// Reads and decodes an entry. A miss is `Ok(None)`.
    pub async fn get<T>(&self, key: &CacheKey, tags: &TagSet) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned,
    {
        let store = self.scope(tags)?;
        let Some(raw) = store.get(key).await? else {
            trace!(?key, "entry missing");
            return Ok(None);
        };
        trace!(?key, bytes = raw.len(), "entry read");
        let value = self
            .format
            .deserialize(&raw)
            .map_err(StoreError::from)?;
        Ok(Some(value))
    }

    /// Checks whether an entry exists.
    pub async fn has(&self, key: &CacheKey, tags: &TagSet) -> Result<bool, CacheError> {
        Ok(self.scope(tags)?.has(key).await?)
    }

    /// Encodes and writes an entry. `ttl = None` leaves expiry to the store.
    pub async fn put<T>(
        &self,
        key: &CacheKey,
        value: &T,
        tags: &TagSet,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>
    where
        T: Serialize + Sync,
    {
        let raw = self
            .format
            .serialize(value)
            .map_err(StoreError::from)?;
        trace!(?key, bytes = raw.len(), ?ttl, format = self.format.name(), "entry write");
        self.scope(tags)?.put(key, raw, ttl).await?;
        Ok(())
    }

    /// Removes a single entry.
    pub async fn delete(&self, key: &CacheKey, tags: &TagSet) -> Result<DeleteStatus, CacheError> {
        Ok(self.scope(tags)?.forget(key).await?)
    }

    /// Clears the tag group, or the whole store when `tags` is empty, and
    /// emits a flush event.
    pub async fn flush(&self, tags: &TagSet) -> Result<(), CacheError> {
        self.scope(tags)?.clear().await?;
        let tags = (!tags.is_empty()).then(|| tags.iter().cloned().collect());
        self.observer.notify(&CacheEvent::Flush { tags });
        Ok(())
    }
}

impl<St, F> fmt::Debug for Repository<St, F>
where
    St: Store,
    F: Format,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("store", &self.store.label())
            .field("format", &self.format.name())
            .finish()
    }
}
