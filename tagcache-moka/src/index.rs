//! Reverse index from tag to the keys written under it.

use dashmap::DashMap;
use tagcache_core::{CacheKey, Tag, TagSet};

/// Maps each tag to the keys (and write generations) that carry it.
#[derive(Debug, Default)]
pub(crate) struct TagIndex {
    tags: DashMap<Tag, DashMap<CacheKey, u64>>,
}

impl TagIndex {
    pub(crate) fn link(&self, key: &CacheKey, tags: &TagSet, generation: u64) {
        for tag in tags {
            self.tags
                .entry(tag.clone())
                .or_default()
                .insert(key.clone(), generation);
        }
    }

    /// Removes `key` from `tags`, but only where the recorded generation is
    /// still `generation`.
    pub(crate) fn unlink(&self, key: &CacheKey, tags: &TagSet, generation: u64) {
        for tag in tags {
            if let Some(keys) = self.tags.get(tag) {
                keys.remove_if(key, |_, linked| *linked == generation);
            }
            self.tags.remove_if(tag, |_, keys| keys.is_empty());
        }
    }

    /// Detaches every key linked to any of `tags` and returns them.
    pub(crate) fn drain(&self, tags: &TagSet) -> Vec<CacheKey> {
        let mut keys = Vec::new();
        for tag in tags {
            if let Some((_, linked)) = self.tags.remove(tag) {
                keys.extend(linked.into_iter().map(|(key, _)| key));
            }
        }
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    pub(crate) fn clear(&self) {
        self.tags.clear();
    }

    #[cfg(test)]
    pub(crate) fn keys(&self, tag: &Tag) -> usize {
        self.tags.get(tag).map_or(0, |keys| keys.len())
    }
}
