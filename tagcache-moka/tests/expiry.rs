//! Expiry and capacity behaviour of the Moka store.

use std::time::Duration;

use bytes::Bytes;
use tagcache_backend::{Store, TaggableStore};
use tagcache_core::{CacheKey, TagSet};
use tagcache_moka::MokaStore;

fn key(id: u32) -> CacheKey {
    CacheKey::from_fingerprint(&format!("GET http://localhost/items/{id}"))
}

#[tokio::test]
async fn test_entry_expires_after_ttl() {
    let store = MokaStore::builder().max_entries(100).build();
    store
        .put(&key(1), Bytes::from_static(b"v"), Some(Duration::from_millis(50)))
        .await
        .unwrap();
    assert!(store.has(&key(1)).await.unwrap());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!store.has(&key(1)).await.unwrap());
}

#[tokio::test]
async fn test_default_ttl_applies_without_explicit_ttl() {
    let store = MokaStore::builder()
        .max_entries(100)
        .default_ttl(Duration::from_millis(50))
        .build();
    store.put(&key(1), Bytes::from_static(b"v"), None).await.unwrap();
    store
        .put(&key(2), Bytes::from_static(b"v"), Some(Duration::from_secs(60)))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!store.has(&key(1)).await.unwrap());
    assert!(store.has(&key(2)).await.unwrap());
}

#[tokio::test]
async fn test_rewrite_uses_new_ttl() {
    let store = MokaStore::builder().max_entries(100).build();
    store
        .put(&key(1), Bytes::from_static(b"v1"), Some(Duration::from_millis(50)))
        .await
        .unwrap();
    store
        .put(&key(1), Bytes::from_static(b"v2"), Some(Duration::from_secs(60)))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(store.get(&key(1)).await.unwrap(), Some(Bytes::from_static(b"v2")));
}

#[tokio::test]
async fn test_max_bytes_evicts_least_recently_used() {
    // 112 bytes of overhead, a 32 byte key and a 100 byte payload per entry
    let single_entry_size = 112 + 32 + 100;
    let store = MokaStore::builder()
        .max_bytes((single_entry_size * 3) as u64)
        .build();

    for i in 1..=4 {
        store
            .put(&key(i), Bytes::from(vec![0u8; 100]), None)
            .await
            .unwrap();
        store.run_pending_tasks().await;
    }

    let mut count = 0;
    for i in 1..=4 {
        if store.has(&key(i)).await.unwrap() {
            count += 1;
        }
    }
    assert_eq!(count, 3, "one entry should have been evicted");
    assert_eq!(store.entry_count(), 3);
}

#[tokio::test]
async fn test_expired_entry_is_invisible_through_view() {
    let store = MokaStore::builder().max_entries(100).build();
    let view = store.tags(&TagSet::from_iter(["users"])).unwrap();
    view.put(&key(1), Bytes::from_static(b"v"), Some(Duration::from_millis(50)))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    store.run_pending_tasks().await;
    assert_eq!(view.get(&key(1)).await.unwrap(), None);
}

#[tokio::test]
async fn test_oversized_ttl_never_expires() {
    let store = MokaStore::builder().max_entries(100).build();
    for (id, ttl) in [
        (1, Duration::from_secs(10_000_000_000_000)),
        (2, Duration::MAX),
    ] {
        store
            .put(&key(id), Bytes::from_static(b"x"), Some(ttl))
            .await
            .unwrap();
        store.run_pending_tasks().await;
        assert_eq!(store.get(&key(id)).await.unwrap(), Some(Bytes::from_static(b"x")));
    }
}
