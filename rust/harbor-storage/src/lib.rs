//! This crate contains a generic interface and concrete implementations for
//! the blob storage that Harbor stages job inputs in and reads fetched
//! resources from. Objects are addressed by a namespace (a bucket or
//! container) and a key within that namespace.

#[macro_use]
extern crate tracing;

mod implementation;
mod retry;
mod store;
mod tracking;

pub use implementation::*;
pub use retry::*;
pub use store::*;
pub use tracking::*;

#[cfg(any(test, feature = "helpers"))]
pub mod helpers;
