//! Moka store capacity metrics.
//!
//! - `tagcache_moka_entries`: current number of entries (gauge)
//! - `tagcache_moka_size_bytes`: current weighted size (gauge)
//!
//! Both carry a `store` label holding the store's label.

use lazy_static::lazy_static;

lazy_static! {
    /// Metric name for cache entry count gauge.
    pub static ref MOKA_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "tagcache_moka_entries",
            "Current number of entries in the Moka store."
        );
        "tagcache_moka_entries"
    };

    /// Metric name for cache size gauge.
    pub static ref MOKA_SIZE_BYTES: &'static str = {
        metrics::describe_gauge!(
            "tagcache_moka_size_bytes",
            "Current weighted size of the Moka store."
        );
        "tagcache_moka_size_bytes"
    };
}

/// Records the entry count and weighted size of a store.
#[inline]
pub fn record_capacity(store: &str, entries: u64, size_bytes: u64) {
    metrics::gauge!(*MOKA_ENTRIES, "store" => store.to_string()).set(entries as f64);
    metrics::gauge!(*MOKA_SIZE_BYTES, "store" => store.to_string()).set(size_bytes as f64);
}
