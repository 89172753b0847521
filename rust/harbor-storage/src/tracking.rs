use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

use crate::store::{ObjectStore, StoredObject};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub puts: usize,
    pub gets: usize,
    pub misses: usize,
    pub bytes_read: usize,
    pub bytes_written: usize,
}

/// This is a store wrapper that tracks I/O. This wrapper is all runtime
/// overhead and should only be used for testing and diagnostics. Clones share
/// the same stats.
#[derive(Debug, Clone)]
pub struct TrackingObjectStore<S: ObjectStore> {
    stats: Arc<Mutex<StoreStats>>,
    store: S,
}

impl<S: ObjectStore> TrackingObjectStore<S> {
    pub async fn to_stats(&self) -> StoreStats {
        self.stats.lock().await.clone()
    }

    pub fn wrap(store: S) -> Self {
        TrackingObjectStore {
            store,
            stats: Default::default(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for TrackingObjectStore<S> {
    async fn put(&self, namespace: &str, key: &str, bytes: Bytes) -> Result<()> {
        let mut stats = self.stats.lock().await;
        stats.puts += 1;
        stats.bytes_written += bytes.len();
        self.store.put(namespace, key, bytes).await
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<StoredObject>> {
        let mut stats = self.stats.lock().await;
        stats.gets += 1;
        let value = self.store.get(namespace, key).await?;
        match &value {
            Some(object) => stats.bytes_read += object.content_length(),
            None => stats.misses += 1,
        }
        Ok(value)
    }

    fn url_for(&self, namespace: &str, key: &str) -> Result<Url> {
        self.store.url_for(namespace, key)
    }
}
