//! Common, generic utilities that are shared across other Harbor packages.
#![warn(missing_docs)]

pub mod tracing;

#[cfg(any(test, feature = "helpers"))]
pub mod helpers;
