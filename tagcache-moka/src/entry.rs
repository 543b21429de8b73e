//! Stored entry and its expiration policy.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use moka::Expiry;
use tagcache_core::{CacheKey, Raw, TagSet};

/// Fixed per-entry overhead used by the byte weigher (key, timestamps, Arc).
pub(crate) const ENTRY_OVERHEAD: usize = 112;

/// Longest TTL that still sets an expiry, about 100 years.
pub(crate) const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 86_400);

static GENERATION: AtomicU64 = AtomicU64::new(1);

/// A payload together with the tags it was written under.
///
/// `generation` is unique per write. The tag index records it so that a late
/// eviction notification for an old value never unlinks a newer write of the
/// same key.
#[derive(Clone, Debug)]
pub(crate) struct Entry {
    pub(crate) data: Raw,
    pub(crate) tags: Arc<TagSet>,
    pub(crate) expire: Option<DateTime<Utc>>,
    pub(crate) generation: u64,
}

impl Entry {
    pub(crate) fn new(data: Raw, tags: Arc<TagSet>, ttl: Option<Duration>) -> Self {
        let expire = ttl.and_then(expire_at);
        Self {
            data,
            tags,
            expire,
            generation: GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Approximate memory cost of the entry in bytes.
    pub(crate) fn memory_size(&self, key: &CacheKey) -> usize {
        ENTRY_OVERHEAD
            + key.as_str().len()
            + self.data.len()
            + self.tags.iter().map(|tag| tag.as_str().len()).sum::<usize>()
    }
}

/// Absolute expiry of a write made now with `ttl`.
///
/// TTLs above [`MAX_TTL`], or reaching past the latest representable
/// timestamp, mean the entry never expires.
fn expire_at(ttl: Duration) -> Option<DateTime<Utc>> {
    if ttl > MAX_TTL {
        return None;
    }
    let ttl = chrono::Duration::from_std(ttl).ok()?;
    Utc::now().checked_add_signed(ttl)
}

/// Expiration policy that calculates TTL from [`Entry::expire`] timestamps.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Expiration;

impl Expiry<CacheKey, Entry> for Expiration {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Self::calculate_ttl(value)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // rewrites take the new value's expiry
        Self::calculate_ttl(value)
    }
}

impl Expiration {
    fn calculate_ttl(value: &Entry) -> Option<Duration> {
        value.expire.map(|expiration| {
            let millis = (expiration - Utc::now()).num_milliseconds();
            if millis <= 0 {
                Duration::ZERO
            } else {
                Duration::from_millis(millis as u64)
            }
        })
    }
}
