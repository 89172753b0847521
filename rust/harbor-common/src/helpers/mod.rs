//! Generic helper utilities intended to be used exclusively in tests and hidden
//! setup for examples

mod wait;

pub use wait::*;
