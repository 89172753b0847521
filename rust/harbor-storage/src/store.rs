use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::{collections::BTreeMap, fmt::Debug, io::Cursor, path::Path};
use tokio::io::AsyncRead;
use url::Url;

/// An object as read back from an [ObjectStore]: its content, and any
/// provider-supplied key/value tags that were stored alongside it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub user_metadata: BTreeMap<String, String>,
}

impl StoredObject {
    pub fn new(bytes: Bytes) -> Self {
        StoredObject {
            bytes,
            user_metadata: BTreeMap::new(),
        }
    }

    pub fn with_user_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.user_metadata.insert(key.into(), value.into());
        self
    }

    pub fn content_length(&self) -> usize {
        self.bytes.len()
    }
}

impl From<Vec<u8>> for StoredObject {
    fn from(bytes: Vec<u8>) -> Self {
        StoredObject::new(bytes.into())
    }
}

/// An open reader over an object's content, along with what the store
/// reported about the object before any of its content was read.
pub struct ObjectStream {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub content_length: Option<u64>,
    pub user_metadata: BTreeMap<String, String>,
}

impl Debug for ObjectStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStream")
            .field("content_length", &self.content_length)
            .field("user_metadata", &self.user_metadata)
            .finish_non_exhaustive()
    }
}

impl From<StoredObject> for ObjectStream {
    fn from(object: StoredObject) -> Self {
        ObjectStream {
            content_length: Some(object.content_length() as u64),
            user_metadata: object.user_metadata,
            reader: Box::new(Cursor::new(object.bytes)),
        }
    }
}

/// A primitive interface for blob storage backends, addressed by a namespace
/// (for example, a bucket or a container) and a key within that namespace.
///
/// Implementations are shared by reference across concurrent callers, so
/// they must be [Send] + [Sync] and any connection pooling or locking they
/// need is their own concern.
#[async_trait]
pub trait ObjectStore: Send + Sync + Debug {
    /// Write bytes to the store against the given namespace and key,
    /// replacing any object already stored there
    async fn put(&self, namespace: &str, key: &str, bytes: Bytes) -> Result<()>;

    /// Read the object stored against the given namespace and key, if any
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<StoredObject>>;

    /// A locator that addresses the object from outside of this process (for
    /// example, a URL that a remote service can read the object from)
    fn url_for(&self, namespace: &str, key: &str) -> Result<Url>;

    /// Upload the contents of a local file
    async fn put_file(&self, namespace: &str, key: &str, path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|error| anyhow!("Could not read {}: {}", path.display(), error))?;
        self.put(namespace, key, bytes.into()).await
    }

    /// Open the object stored against the given namespace and key for
    /// reading, if there is one. Stores that can hand out their content
    /// incrementally override this; the default reads the whole object.
    async fn get_stream(&self, namespace: &str, key: &str) -> Result<Option<ObjectStream>> {
        Ok(self.get(namespace, key).await?.map(ObjectStream::from))
    }

    /// Same as `get`, but turns a `None` value into an error.
    async fn require(&self, namespace: &str, key: &str) -> Result<StoredObject> {
        match self.get(namespace, key).await? {
            Some(object) => Ok(object),
            None => Err(anyhow!("No object found for {}/{}", namespace, key)),
        }
    }
}

/// Rejects keys and namespaces that are empty or that could escape their
/// parent when mapped onto a hierarchical path.
pub fn validate_object_key(namespace: &str, key: &str) -> Result<()> {
    if namespace.is_empty() || namespace.contains('/') || namespace == ".." || namespace == "." {
        return Err(anyhow!("Invalid namespace: {:?}", namespace));
    }

    if key.is_empty() || key.starts_with('/') {
        return Err(anyhow!("Invalid object key: {:?}", key));
    }

    if key.split('/').any(|part| part == ".." || part == "." || part.is_empty()) {
        return Err(anyhow!("Invalid object key: {:?}", key));
    }

    Ok(())
}
