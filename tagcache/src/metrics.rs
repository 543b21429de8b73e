//! Metrics declaration and the metrics-backed observer.
//!
//! - `tagcache_hit_total`: cache hits, by method
//! - `tagcache_miss_total`: cache misses, by method
//! - `tagcache_flush_total`: flushes, by scope (`all` or `tags`)

use lazy_static::lazy_static;

use crate::events::{CacheEvent, CacheObserver};

lazy_static! {
    /// Track number of cache hit events.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "tagcache_hit_total",
            "Total number of cache hit events."
        );
        "tagcache_hit_total"
    };
    /// Track number of cache miss events.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "tagcache_miss_total",
            "Total number of cache miss events."
        );
        "tagcache_miss_total"
    };
    /// Track number of flushes.
    pub static ref CACHE_FLUSH_COUNTER: &'static str = {
        metrics::describe_counter!(
            "tagcache_flush_total",
            "Total number of cache flushes."
        );
        "tagcache_flush_total"
    };
}

/// Observer recording events as `metrics` counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

impl CacheObserver for MetricsObserver {
    fn notify(&self, event: &CacheEvent) {
        match event {
            CacheEvent::Hit { method, .. } => {
                metrics::counter!(*CACHE_HIT_COUNTER, "method" => method.to_string()).increment(1)
            }
            CacheEvent::Miss { method, .. } => {
                metrics::counter!(*CACHE_MISS_COUNTER, "method" => method.to_string()).increment(1)
            }
            CacheEvent::Flush { tags } => {
                let scope = if tags.is_some() { "tags" } else { "all" };
                metrics::counter!(*CACHE_FLUSH_COUNTER, "scope" => scope).increment(1)
            }
        }
    }
}
