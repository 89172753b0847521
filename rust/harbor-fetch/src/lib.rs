//! Fetchers retrieve a byte stream for a key from some named source (a local
//! directory, an object store, an HTTP server) and record what they learned
//! about the resource in a caller-supplied [Metadata] record.
//!
//! Implementations are selected by their stable plugin id through a
//! [FetcherRegistry] that the host builds at startup:
//!
//! ```rust,no_run
//! # use anyhow::Result;
//! # use harbor_fetch::{FetchContext, FetcherRegistry, FileSystemFetcher, Metadata};
//! # use tokio::io::AsyncReadExt;
//! #
//! # #[tokio::main(flavor = "multi_thread")]
//! # async fn main() -> Result<()> {
//! let mut registry = FetcherRegistry::default();
//! registry.register(FileSystemFetcher::new("/srv/docs"))?;
//!
//! let mut metadata = Metadata::default();
//! let mut stream = registry
//!     .fetch(FileSystemFetcher::PLUGIN_ID, "report.pdf", &mut metadata, &FetchContext::default())
//!     .await?;
//!
//! let mut bytes = Vec::new();
//! stream.read_to_end(&mut bytes).await?;
//! #   Ok(())
//! # }
//! ```

#[macro_use]
extern crate tracing;

mod context;
mod error;
mod fetcher;
mod implementation;
mod metadata;
mod registry;
mod spool;

pub use context::*;
pub use error::*;
pub use fetcher::*;
pub use implementation::*;
pub use metadata::*;
pub use registry::*;
pub use spool::*;
