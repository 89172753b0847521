//! Test doubles for exercising failure paths of [ObjectStore] consumers

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use url::Url;

use crate::store::{ObjectStore, StoredObject};

/// An [ObjectStore] whose writes always fail and which never holds any
/// objects. It counts the writes that were attempted against it.
#[derive(Clone, Debug, Default)]
pub struct FailingObjectStore {
    attempted_puts: Arc<AtomicUsize>,
}

impl FailingObjectStore {
    pub fn attempted_puts(&self) -> usize {
        self.attempted_puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn put(&self, namespace: &str, key: &str, _bytes: Bytes) -> Result<()> {
        self.attempted_puts.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("Refusing to store {}/{}", namespace, key))
    }

    async fn get(&self, _namespace: &str, _key: &str) -> Result<Option<StoredObject>> {
        Ok(None)
    }

    fn url_for(&self, namespace: &str, key: &str) -> Result<Url> {
        Ok(Url::parse(&format!("failing:///{}/{}", namespace, key))?)
    }
}
