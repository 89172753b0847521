use async_trait::async_trait;
use harbor_storage::{
    validate_object_key, HttpObjectStore, ObjectStore, ObjectStoreRetry, DEFAULT_ATTEMPT_TIMEOUT,
    DEFAULT_MAX_RETRIES,
};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::{
    fetcher::{record_source, require_key},
    FetchContext, FetchError, FetchStream, Fetcher, Metadata, SpooledFile, CONTENT_LENGTH,
};

/// Configuration for fetching from an HTTP blob service (for example, Azure
/// Blob Storage authorized with a SAS token).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BlobFetcherConfig {
    pub endpoint: Option<String>,
    pub container: Option<String>,
    pub sas_token: Option<String>,
    #[serde(default)]
    pub spool_to_temp: bool,
    #[serde(default)]
    pub extract_user_metadata: bool,
    /// Further attempts made when reading an object fails or stalls
    pub max_retries: Option<u32>,
    /// Time allowed for each attempt to open an object
    pub attempt_timeout_secs: Option<u64>,
}

impl BlobFetcherConfig {
    /// Build a [BlobFetcher] for this configuration.
    pub fn build(&self) -> Result<BlobFetcher, FetchError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or_else(|| FetchError::Configuration("blob fetcher requires an endpoint".into()))?;
        let endpoint = Url::parse(endpoint).map_err(|error| {
            FetchError::Configuration(format!("blob fetcher endpoint is not a URL: {error}"))
        })?;
        let container = self
            .container
            .as_deref()
            .filter(|container| !container.trim().is_empty())
            .ok_or_else(|| FetchError::Configuration("blob fetcher requires a container".into()))?;

        let store = ObjectStoreRetry::new(
            HttpObjectStore::new(endpoint, self.sas_token.clone()),
            self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            self.attempt_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_ATTEMPT_TIMEOUT),
        );

        Ok(BlobFetcher {
            inner: ObjectStoreFetcher::new(store, container)
                .with_spool_to_temp(self.spool_to_temp)
                .with_user_metadata(self.extract_user_metadata),
        })
    }
}

/// Fetches blobs from one container of an HTTP blob service, retrying reads
/// that fail or stall. Built from a [BlobFetcherConfig].
#[derive(Clone, Debug)]
pub struct BlobFetcher {
    inner: ObjectStoreFetcher<ObjectStoreRetry<HttpObjectStore>>,
}

impl BlobFetcher {
    pub const PLUGIN_ID: &'static str = "blob-fetcher";

    pub fn container(&self) -> &str {
        self.inner.container()
    }

    pub fn store(&self) -> &ObjectStoreRetry<HttpObjectStore> {
        self.inner.store()
    }
}

#[async_trait]
impl Fetcher for BlobFetcher {
    fn plugin_id(&self) -> &'static str {
        Self::PLUGIN_ID
    }

    async fn fetch(
        &self,
        key: &str,
        metadata: &mut Metadata,
        context: &FetchContext,
    ) -> Result<FetchStream, FetchError> {
        self.inner
            .fetch_as(Self::PLUGIN_ID, key, metadata, context)
            .await
    }
}

/// Fetches objects out of one container (bucket, namespace) of an
/// [ObjectStore]. Keys are object keys within that container.
#[derive(Clone, Debug)]
pub struct ObjectStoreFetcher<S>
where
    S: ObjectStore,
{
    store: S,
    container: String,
    spool_to_temp: bool,
    extract_user_metadata: bool,
}

impl<S> ObjectStoreFetcher<S>
where
    S: ObjectStore,
{
    pub const PLUGIN_ID: &'static str = "object-store-fetcher";

    pub fn new<C: Into<String>>(store: S, container: C) -> Self {
        ObjectStoreFetcher {
            store,
            container: container.into(),
            spool_to_temp: false,
            extract_user_metadata: false,
        }
    }

    /// Always materialize objects into a local temporary file first
    pub fn with_spool_to_temp(mut self, spool_to_temp: bool) -> Self {
        self.spool_to_temp = spool_to_temp;
        self
    }

    /// Copy the object's user metadata into the caller's [Metadata]
    pub fn with_user_metadata(mut self, extract_user_metadata: bool) -> Self {
        self.extract_user_metadata = extract_user_metadata;
        self
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) async fn fetch_as(
        &self,
        plugin_id: &'static str,
        key: &str,
        metadata: &mut Metadata,
        context: &FetchContext,
    ) -> Result<FetchStream, FetchError> {
        if self.container.trim().is_empty() {
            return Err(FetchError::Configuration(
                "object store fetcher has no container".into(),
            ));
        }
        require_key(key)?;
        validate_object_key(&self.container, key)
            .map_err(|_| FetchError::invalid_key(key, "key is not a valid object key"))?;

        let object = self
            .store
            .get_stream(&self.container, key)
            .await?
            .ok_or_else(|| FetchError::NotFound(key.to_string()))?;
        let locator = self.store.url_for(&self.container, key)?;

        debug!(
            "Opened {} from {} ({:?} bytes)",
            key, locator, object.content_length
        );

        if self.extract_user_metadata {
            metadata.set_all(&object.user_metadata);
        }

        let stream: FetchStream = if self.spool_to_temp || context.spool_to_temp {
            let spooled = SpooledFile::spool(object.reader).await?;
            metadata.set(CONTENT_LENGTH, spooled.len().to_string());
            Box::new(spooled)
        } else {
            if let Some(content_length) = object.content_length {
                metadata.set(CONTENT_LENGTH, content_length.to_string());
            }
            object.reader
        };

        record_source(metadata, plugin_id, locator.as_str());

        Ok(stream)
    }
}

#[async_trait]
impl<S> Fetcher for ObjectStoreFetcher<S>
where
    S: ObjectStore,
{
    fn plugin_id(&self) -> &'static str {
        Self::PLUGIN_ID
    }

    async fn fetch(
        &self,
        key: &str,
        metadata: &mut Metadata,
        context: &FetchContext,
    ) -> Result<FetchStream, FetchError> {
        self.fetch_as(Self::PLUGIN_ID, key, metadata, context).await
    }
}
