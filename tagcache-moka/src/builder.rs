//! Builder for configuring [`MokaStore`].

use std::sync::Arc;
use std::time::Duration;

use moka::future::{Cache, CacheBuilder};
use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use tagcache_core::{CacheKey, StoreLabel};

use crate::entry::{Entry, Expiration};
use crate::index::TagIndex;
use crate::store::MokaStore;

/// Marker type: capacity has not been configured yet.
///
/// This is the initial state of a [`MokaStoreBuilder`]. You must call either
/// [`max_entries()`](MokaStoreBuilder::max_entries) or
/// [`max_bytes()`](MokaStoreBuilder::max_bytes) before calling `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
///
/// The weight of an entry covers its payload, its key and its tags plus a
/// fixed overhead.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for creating and configuring a [`MokaStore`].
///
/// Use [`MokaStore::builder`] to create a new builder instance. Capacity is
/// required and set with exactly one of [`max_entries`](Self::max_entries) or
/// [`max_bytes`](Self::max_bytes); `build()` only exists afterwards.
///
/// ```
/// use std::time::Duration;
/// use tagcache_moka::MokaStore;
///
/// let store = MokaStore::builder()
///     .label("responses")
///     .max_bytes(64 * 1024 * 1024)
///     .default_ttl(Duration::from_secs(600))
///     .build();
/// ```
pub struct MokaStoreBuilder<Cap> {
    capacity: Cap,
    label: StoreLabel,
    eviction_policy: Option<EvictionPolicy>,
    default_ttl: Option<Duration>,
    taggable: bool,
}

impl MokaStoreBuilder<NoCapacity> {
    /// Creates a new builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            label: StoreLabel::new_static("moka"),
            eviction_policy: None,
            default_ttl: None,
            taggable: true,
        }
    }

    /// Sets the maximum number of entries the cache can hold.
    pub fn max_entries(self, capacity: u64) -> MokaStoreBuilder<EntryCapacity> {
        self.with_capacity(EntryCapacity(capacity))
    }

    /// Sets the approximate memory budget in bytes.
    pub fn max_bytes(self, bytes: u64) -> MokaStoreBuilder<ByteCapacity> {
        self.with_capacity(ByteCapacity(bytes))
    }

    fn with_capacity<Cap>(self, capacity: Cap) -> MokaStoreBuilder<Cap> {
        MokaStoreBuilder {
            capacity,
            label: self.label,
            eviction_policy: self.eviction_policy,
            default_ttl: self.default_ttl,
            taggable: self.taggable,
        }
    }
}

impl Default for MokaStoreBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaStoreBuilder<Cap> {
    /// Sets a custom label for this store.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<StoreLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the eviction policy for the cache.
    ///
    /// # Default
    ///
    /// - entry-based capacity: [`EvictionPolicy::tiny_lfu()`]
    /// - byte-based capacity: [`EvictionPolicy::lru()`], since TinyLFU admission
    ///   can reject weighted entries even when eviction could make room
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    /// Expiry applied when a write does not carry its own TTL.
    ///
    /// Without it such entries live until evicted.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Builds a store that does not advertise tag capability.
    ///
    /// Callers then fall back to plain keyed access and flushing empties the
    /// whole cache.
    pub fn untagged(mut self) -> Self {
        self.taggable = false;
        self
    }

    fn assemble(
        self,
        cache_builder: CacheBuilder<CacheKey, Entry, Cache<CacheKey, Entry>>,
        policy: EvictionPolicy,
    ) -> MokaStore {
        let index = Arc::new(TagIndex::default());
        let listener_index = Arc::clone(&index);
        let cache = cache_builder
            .eviction_policy(policy)
            .expire_after(Expiration)
            .eviction_listener(move |key: Arc<CacheKey>, entry: Entry, cause: RemovalCause| {
                tracing::trace!(?key, ?cause, "entry removed");
                listener_index.unlink(&key, &entry.tags, entry.generation);
            })
            .build();

        MokaStore {
            cache,
            index,
            label: self.label,
            default_ttl: self.default_ttl,
            taggable: self.taggable,
        }
    }
}

impl MokaStoreBuilder<EntryCapacity> {
    /// Builds the [`MokaStore`] with entry-count based capacity.
    pub fn build(mut self) -> MokaStore {
        let policy = self
            .eviction_policy
            .take()
            .unwrap_or_else(EvictionPolicy::tiny_lfu);
        let cache_builder = CacheBuilder::new(self.capacity.0);
        self.assemble(cache_builder, policy)
    }
}

impl MokaStoreBuilder<ByteCapacity> {
    /// Builds the [`MokaStore`] with byte-based capacity.
    pub fn build(mut self) -> MokaStore {
        let policy = self
            .eviction_policy
            .take()
            .unwrap_or_else(EvictionPolicy::lru);
        let cache_builder = CacheBuilder::new(self.capacity.0).weigher(byte_weigher);
        self.assemble(cache_builder, policy)
    }
}

fn byte_weigher(key: &CacheKey, entry: &Entry) -> u32 {
    entry.memory_size(key).min(u32::MAX as usize) as u32
}
