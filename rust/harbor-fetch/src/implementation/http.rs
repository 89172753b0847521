use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::{pin::Pin, time::Duration};
use tokio_util::io::StreamReader;
use url::Url;

use crate::{
    fetcher::{record_source, require_key},
    FetchContext, FetchError, FetchStream, Fetcher, Metadata, SpooledFile, CONTENT_LENGTH,
};

type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Configuration for an [HttpFetcher].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct HttpFetcherConfig {
    /// When set, keys are resolved relative to this URL; otherwise keys must
    /// be absolute URLs
    pub base_url: Option<String>,
    #[serde(default)]
    pub spool_to_temp: bool,
    pub timeout_secs: Option<u64>,
}

/// Fetches resources over HTTP(S), streaming the response body.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: Client,
    base_url: Option<Url>,
    spool_to_temp: bool,
}

impl HttpFetcher {
    pub const PLUGIN_ID: &'static str = "http-fetcher";

    pub fn new(base_url: Option<Url>) -> Self {
        HttpFetcher {
            client: Client::new(),
            base_url,
            spool_to_temp: false,
        }
    }

    pub fn from_config(config: &HttpFetcherConfig) -> Result<Self, FetchError> {
        let base_url = match config.base_url.as_deref() {
            Some(base_url) => Some(Url::parse(base_url).map_err(|error| {
                FetchError::Configuration(format!("http fetcher base_url is not a URL: {error}"))
            })?),
            None => None,
        };

        let mut builder = Client::builder();
        if let Some(timeout_secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|error| FetchError::Configuration(format!("http client: {error}")))?;

        Ok(HttpFetcher {
            client,
            base_url,
            spool_to_temp: config.spool_to_temp,
        })
    }

    pub(crate) fn resolve(&self, key: &str) -> Result<Url, FetchError> {
        require_key(key)?;

        let url = match &self.base_url {
            Some(base_url) => base_url.join(key),
            None => Url::parse(key),
        }
        .map_err(|_| FetchError::invalid_key(key, "key does not resolve to a URL"))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(FetchError::invalid_key(key, "only http and https are supported")),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn plugin_id(&self) -> &'static str {
        Self::PLUGIN_ID
    }

    async fn fetch(
        &self,
        key: &str,
        metadata: &mut Metadata,
        context: &FetchContext,
    ) -> Result<FetchStream, FetchError> {
        let url = self.resolve(key)?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|error| FetchError::Transport(error.into()))?;

        match response.status() {
            status if status.is_success() => (),
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                return Err(FetchError::NotFound(key.to_string()))
            }
            other_status => {
                return Err(FetchError::Transport(anyhow!(
                    "Unexpected status code fetching {}: {}",
                    url,
                    other_status
                )))
            }
        }

        let content_length = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        let body: ByteStream = Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(|error| std::io::Error::new(std::io::ErrorKind::Other, error))),
        );
        let reader = StreamReader::new(body);

        let stream: FetchStream = if self.spool_to_temp || context.spool_to_temp {
            let spooled = SpooledFile::spool(reader).await?;
            metadata.set(CONTENT_LENGTH, spooled.len().to_string());
            Box::new(spooled)
        } else {
            if let Some(content_length) = content_length {
                metadata.set(CONTENT_LENGTH, content_length);
            }
            Box::new(reader)
        };

        debug!("Fetched {} from {}", key, url);
        record_source(metadata, Self::PLUGIN_ID, url.as_str());

        Ok(stream)
    }
}
