//! Drives long-running remote transcription jobs to completion.
//!
//! A [Transcriber] stages a local media file in an [harbor_storage::ObjectStore],
//! submits a job for it to a [JobBackend], and then polls the backend with a
//! bounded backoff until the job reaches a terminal state. Polling happens on
//! the caller's own task; nothing is spawned in the background.
//!
//! Whether a [Transcriber] may be used at all is decided by its
//! [Credentials]; with missing or placeholder credentials every operation
//! returns an explicit "unavailable" value and no backend is contacted.

#[macro_use]
extern crate tracing;

mod availability;
mod backend;
mod config;
mod error;
mod job;
mod poll;
mod transcriber;

pub use availability::*;
pub use backend::*;
pub use config::*;
pub use error::*;
pub use job::*;
pub use poll::*;
pub use transcriber::*;
