use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use url::Url;

use crate::store::{ObjectStore, StoredObject};

/// A memory-backed [ObjectStore] implementation.
///
/// Useful for small, short-lived storages and testing. Clones share the
/// same underlying entries.
#[derive(Default, Clone, Debug)]
pub struct MemoryObjectStore {
    namespaces: Arc<Mutex<HashMap<String, HashMap<String, StoredObject>>>>,
}

impl MemoryObjectStore {
    /// Store a complete [StoredObject], including its user metadata.
    pub async fn put_object(&self, namespace: &str, key: &str, object: StoredObject) {
        let mut namespaces = self.namespaces.lock().await;
        namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), object);
    }

    /// Return all keys stored in the given namespace, sorted.
    pub async fn keys(&self, namespace: &str) -> Vec<String> {
        let namespaces = self.namespaces.lock().await;
        let mut keys: Vec<String> = namespaces
            .get(namespace)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, namespace: &str, key: &str, bytes: Bytes) -> Result<()> {
        self.put_object(namespace, key, StoredObject::new(bytes))
            .await;
        Ok(())
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<StoredObject>> {
        let namespaces = self.namespaces.lock().await;
        Ok(namespaces
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    fn url_for(&self, namespace: &str, key: &str) -> Result<Url> {
        let mut url = Url::parse("memory:///")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Could not derive a locator for {}/{}", namespace, key))?
            .pop_if_empty()
            .push(namespace)
            .extend(key.split('/'));
        Ok(url)
    }
}
