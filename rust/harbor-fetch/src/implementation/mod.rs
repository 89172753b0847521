mod fs;
mod http;
mod object_store;

pub use fs::*;
pub use http::*;
pub use object_store::*;
