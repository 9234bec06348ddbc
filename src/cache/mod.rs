//! On-disk body cache
//!
//! Maps URLs to deterministic relative paths and reads/writes the cached
//! bodies at those paths.

pub mod path;
pub mod store;

pub use path::{parse_url, to_path};
pub use store::{cache_file_path, CacheStore, FsStorage, Storage};
