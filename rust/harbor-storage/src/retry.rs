use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::{future::Future, path::Path, time::Duration};
use url::Url;

use crate::store::{ObjectStore, ObjectStream, StoredObject};

/// Attempts made on a read before giving up when not configured otherwise
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Time allowed for a single read attempt when not configured otherwise
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Wraps an [ObjectStore] so that reads which fail or stall are attempted
/// again. Each attempt is limited to `timeout`, and up to `max_retries`
/// further attempts follow a failed first one. A missing object is an
/// answer, not a failure, and is never retried.
///
/// For [ObjectStore::get_stream] only opening the object is covered; once a
/// reader is handed out, errors while reading it belong to the caller.
///
/// Writes are passed through untouched.
#[derive(Clone, Debug)]
pub struct ObjectStoreRetry<S>
where
    S: ObjectStore,
{
    store: S,
    timeout: Duration,
    max_retries: u32,
}

impl<S> ObjectStoreRetry<S>
where
    S: ObjectStore,
{
    pub fn new(store: S, max_retries: u32, timeout: Duration) -> Self {
        ObjectStoreRetry {
            store,
            max_retries,
            timeout,
        }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt<'a, T, F, Fut>(&'a self, namespace: &str, key: &str, read: F) -> Result<T>
    where
        F: Fn(&'a S) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            let error = match tokio::time::timeout(self.timeout, read(&self.store)).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(error)) => error,
                Err(_) => anyhow!("no answer within {:?}", self.timeout),
            };

            if attempts > self.max_retries {
                return Err(anyhow!(
                    "Could not read {}/{} in {} attempts: {}",
                    namespace,
                    key,
                    attempts,
                    error
                ));
            }

            debug!(
                "Read of {}/{} failed on attempt {} ({}); trying again",
                namespace, key, attempts, error
            );
        }
    }
}

#[async_trait]
impl<S> ObjectStore for ObjectStoreRetry<S>
where
    S: ObjectStore,
{
    async fn put(&self, namespace: &str, key: &str, bytes: Bytes) -> Result<()> {
        self.store.put(namespace, key, bytes).await
    }

    async fn put_file(&self, namespace: &str, key: &str, path: &Path) -> Result<()> {
        self.store.put_file(namespace, key, path).await
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<StoredObject>> {
        self.attempt(namespace, key, |store| store.get(namespace, key))
            .await
    }

    async fn get_stream(&self, namespace: &str, key: &str) -> Result<Option<ObjectStream>> {
        self.attempt(namespace, key, |store| store.get_stream(namespace, key))
            .await
    }

    fn url_for(&self, namespace: &str, key: &str) -> Result<Url> {
        self.store.url_for(namespace, key)
    }
}
