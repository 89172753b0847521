mod fs;
mod http;
mod memory;

pub use fs::*;
pub use http::*;
pub use memory::*;
