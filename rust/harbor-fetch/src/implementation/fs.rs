use async_trait::async_trait;
use serde::Deserialize;
use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use crate::{
    fetcher::{record_source, require_key},
    FetchContext, FetchError, FetchStream, Fetcher, Metadata, CONTENT_LENGTH,
};

/// Configuration for a [FileSystemFetcher], suitable for embedding in a host
/// configuration file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FileSystemFetcherConfig {
    pub base_path: Option<PathBuf>,
}

/// Fetches files beneath a base directory. Keys are paths relative to the
/// base directory, and may not climb out of it.
///
/// The stream is always the file itself; spool mode has nothing to add for a
/// source that is already local.
#[derive(Clone, Debug)]
pub struct FileSystemFetcher {
    base_path: Option<PathBuf>,
}

impl FileSystemFetcher {
    pub const PLUGIN_ID: &'static str = "file-system-fetcher";

    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        FileSystemFetcher {
            base_path: Some(base_path.as_ref().to_path_buf()),
        }
    }

    pub fn from_config(config: &FileSystemFetcherConfig) -> Self {
        FileSystemFetcher {
            base_path: config.base_path.clone(),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, FetchError> {
        let base_path = self
            .base_path
            .as_ref()
            .ok_or_else(|| FetchError::Configuration("file system fetcher has no base_path".into()))?;

        require_key(key)?;

        for component in Path::new(key).components() {
            match component {
                Component::Normal(_) | Component::CurDir => (),
                Component::ParentDir => {
                    return Err(FetchError::invalid_key(key, "key may not refer to a parent directory"))
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(FetchError::invalid_key(key, "key must be a relative path"))
                }
            }
        }

        Ok(base_path.join(key))
    }
}

#[async_trait]
impl Fetcher for FileSystemFetcher {
    fn plugin_id(&self) -> &'static str {
        Self::PLUGIN_ID
    }

    async fn fetch(
        &self,
        key: &str,
        metadata: &mut Metadata,
        _context: &FetchContext,
    ) -> Result<FetchStream, FetchError> {
        let path = self.resolve(key)?;

        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(FetchError::NotFound(key.to_string()))
            }
            Err(error) => return Err(error.into()),
        };

        let file_metadata = file.metadata().await?;
        if !file_metadata.is_file() {
            return Err(FetchError::NotFound(key.to_string()));
        }

        let locator = tokio::fs::canonicalize(&path).await.unwrap_or(path);

        debug!("Fetched {} from {}", key, locator.display());

        metadata.set(CONTENT_LENGTH, file_metadata.len().to_string());
        record_source(metadata, Self::PLUGIN_ID, &locator.to_string_lossy());

        Ok(Box::new(file))
    }
}
