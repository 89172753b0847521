use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::{header::HeaderMap, Client, Response, StatusCode};
use std::{collections::BTreeMap, io};
use tokio_util::io::StreamReader;
use url::Url;

use crate::store::{validate_object_key, ObjectStore, ObjectStream, StoredObject};

/// Header prefixes under which blob services return user-defined metadata
const USER_METADATA_PREFIXES: [&str; 2] = ["x-ms-meta-", "x-amz-meta-"];

/// A high-level HTTP client for a blob service that exposes objects at
/// `{endpoint}/{namespace}/{key}`, optionally authorized by a pre-signed
/// query token (for example, an Azure SAS token).
#[derive(Clone)]
pub struct HttpObjectStore {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(endpoint: Url, token: Option<String>) -> Self {
        HttpObjectStore {
            client: Client::new(),
            endpoint,
            token: token.map(|token| token.trim_start_matches('?').to_string()),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The object URL with the query token applied, used for requests
    pub(crate) fn make_authorized_url(&self, namespace: &str, key: &str) -> Result<Url> {
        let mut url = self.url_for(namespace, key)?;
        if let Some(token) = &self.token {
            url.set_query(Some(token));
        }
        Ok(url)
    }

    /// Issue a GET for the object; `None` when the service reports 404
    async fn open(&self, namespace: &str, key: &str) -> Result<Option<Response>> {
        let url = self.make_authorized_url(namespace, key)?;
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response)),
            StatusCode::NOT_FOUND => Ok(None),
            other_status => Err(anyhow!(
                "Unexpected status code reading {}/{}: {}",
                namespace,
                key,
                other_status
            )),
        }
    }
}

impl std::fmt::Debug for HttpObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpObjectStore")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

pub(crate) fn user_metadata_from_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut user_metadata = BTreeMap::new();

    for (name, value) in headers.iter() {
        let name = name.as_str();
        let Some(prefix) = USER_METADATA_PREFIXES
            .iter()
            .find(|prefix| name.starts_with(*prefix))
        else {
            continue;
        };

        match value.to_str() {
            Ok(value) => {
                user_metadata.insert(name[prefix.len()..].to_string(), value.to_string());
            }
            Err(_) => warn!("Skipping non-text user metadata header {}", name),
        }
    }

    user_metadata
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, namespace: &str, key: &str, bytes: Bytes) -> Result<()> {
        let url = self.make_authorized_url(namespace, key)?;
        let response = self
            .client
            .put(url)
            .header("x-ms-blob-type", "BlockBlob")
            .body(bytes)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            other_status => Err(anyhow!(
                "Unexpected status code writing {}/{}: {}",
                namespace,
                key,
                other_status
            )),
        }
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<StoredObject>> {
        let Some(response) = self.open(namespace, key).await? else {
            return Ok(None);
        };

        let user_metadata = user_metadata_from_headers(response.headers());
        let bytes = response.bytes().await?;
        Ok(Some(StoredObject {
            bytes,
            user_metadata,
        }))
    }

    async fn get_stream(&self, namespace: &str, key: &str) -> Result<Option<ObjectStream>> {
        let Some(response) = self.open(namespace, key).await? else {
            return Ok(None);
        };

        let user_metadata = user_metadata_from_headers(response.headers());
        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|error| io::Error::new(io::ErrorKind::Other, error)))
            .boxed();

        trace!("Streaming {}/{} ({:?} bytes)", namespace, key, content_length);

        Ok(Some(ObjectStream {
            reader: Box::new(StreamReader::new(body)),
            content_length,
            user_metadata,
        }))
    }

    fn url_for(&self, namespace: &str, key: &str) -> Result<Url> {
        validate_object_key(namespace, key)?;

        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| anyhow!("Endpoint {} can not be a base URL", self.endpoint))?
            .pop_if_empty()
            .push(namespace)
            .extend(key.split('/'));
        Ok(url)
    }
}
