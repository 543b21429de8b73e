#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tagcache::{CacheEvent, CacheObserver, CacheSettings, DeleteStatus, Store, StoreError};
use tagcache_backend::StoreResult;
use tagcache_core::{CacheKey, Raw, StoreLabel};

/// Plain key/value store without tag capability.
#[derive(Default)]
pub struct MapStore {
    pub entries: DashMap<CacheKey, Raw>,
}

#[async_trait]
impl Store for MapStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<Raw>> {
        Ok(self.entries.get(key).map(|v| v.clone()))
    }

    async fn put(&self, key: &CacheKey, value: Raw, _ttl: Option<Duration>) -> StoreResult<()> {
        self.entries.insert(key.clone(), value);
        Ok(())
    }

    async fn forget(&self, key: &CacheKey) -> StoreResult<DeleteStatus> {
        Ok(match self.entries.remove(key) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    async fn clear(&self) -> StoreResult<()> {
        self.entries.clear();
        Ok(())
    }

    fn label(&self) -> StoreLabel {
        StoreLabel::new_static("map")
    }
}

/// Store whose reads and writes always fail.
pub struct UnreachableStore;

fn refused() -> StoreError {
    StoreError::ConnectionError(Box::new(std::io::Error::other("connection refused")))
}

#[async_trait]
impl Store for UnreachableStore {
    async fn get(&self, _key: &CacheKey) -> StoreResult<Option<Raw>> {
        Err(refused())
    }

    async fn put(&self, _key: &CacheKey, _value: Raw, _ttl: Option<Duration>) -> StoreResult<()> {
        Err(refused())
    }

    async fn forget(&self, _key: &CacheKey) -> StoreResult<DeleteStatus> {
        Err(refused())
    }

    async fn clear(&self) -> StoreResult<()> {
        Err(refused())
    }

    fn label(&self) -> StoreLabel {
        StoreLabel::new_static("unreachable")
    }
}

/// Observer keeping every event it receives.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<CacheEvent>>);

impl Recorder {
    pub fn events(&self) -> Vec<CacheEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl CacheObserver for Recorder {
    fn notify(&self, event: &CacheEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

pub fn recorder() -> Arc<Recorder> {
    Arc::new(Recorder::default())
}

/// Default settings selecting the store labelled `store`.
pub fn settings_for(store: &str) -> CacheSettings {
    CacheSettings {
        store: store.to_owned(),
        ..CacheSettings::default()
    }
}
