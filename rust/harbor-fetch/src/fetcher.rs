use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::{FetchContext, FetchError, Metadata, FETCHER, SOURCE_LOCATOR};

/// A readable byte stream handed to the caller by a [Fetcher]. The caller
/// owns it; dropping it releases whatever backs it (a file handle, a
/// connection, a spooled temporary file).
pub type FetchStream = Box<dyn AsyncRead + Send + Unpin>;

/// A generic interface for retrieving resources from a named source. Each
/// implementation backs onto one kind of source and identifies itself with a
/// stable plugin id.
///
/// Implementations are shared across concurrent callers through `&self`, and
/// must not keep per-call mutable state.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// The stable identifier this implementation is registered under. This
    /// is a constant of the implementing type, not of the instance.
    fn plugin_id(&self) -> &'static str;

    /// Open a stream over the resource identified by `key`, positioned at its
    /// start. On success, `metadata` has gained at least the resolved source
    /// locator of the resource.
    async fn fetch(
        &self,
        key: &str,
        metadata: &mut Metadata,
        context: &FetchContext,
    ) -> Result<FetchStream, FetchError>;
}

/// Records the entries every successful fetch must leave behind
pub(crate) fn record_source(metadata: &mut Metadata, plugin_id: &'static str, locator: &str) {
    metadata.set(SOURCE_LOCATOR, locator);
    metadata.set(FETCHER, plugin_id);
}

pub(crate) fn require_key(key: &str) -> Result<(), FetchError> {
    if key.trim().is_empty() {
        return Err(FetchError::invalid_key(key, "key must not be empty"));
    }
    Ok(())
}
