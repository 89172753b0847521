use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use url::Url;

use crate::store::{validate_object_key, ObjectStore, StoredObject};

/// An [ObjectStore] that keeps each namespace as a directory beneath a root
/// directory, and each object as a file within its namespace directory.
/// File-backed objects carry no user metadata.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        FsObjectStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn object_path(&self, namespace: &str, key: &str) -> Result<PathBuf> {
        validate_object_key(namespace, key)?;
        Ok(key
            .split('/')
            .fold(self.root.join(namespace), |path, part| path.join(part)))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, namespace: &str, key: &str, bytes: Bytes) -> Result<()> {
        let path = self.object_path(namespace, key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        trace!("Writing {} bytes to {}", bytes.len(), path.display());
        tokio::fs::write(&path, &bytes).await?;
        Ok(())
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<StoredObject>> {
        let path = self.object_path(namespace, key)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(StoredObject::from(bytes))),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn url_for(&self, namespace: &str, key: &str) -> Result<Url> {
        let path = self.object_path(namespace, key)?;
        let path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()?.join(path)
        };

        Url::from_file_path(&path)
            .map_err(|_| anyhow!("Could not derive a locator for {}", path.display()))
    }
}
