//! Downcache - disk-backed HTTP response cache
//!
//! Returns a previously stored response body for a URL when one exists,
//! otherwise fetches it live, stores the body under a path derived from the
//! URL, and returns it. Live fetches pass through a token-bucket rate limiter.
//!
//! ```no_run
//! use downcache::{Config, Downcache, FetchRequest};
//!
//! # async fn run() -> downcache::Result<()> {
//! let cache = Downcache::new(Config::default())?;
//! let result = cache
//!     .retrieve(FetchRequest::new("https://example.com/data.json").json(true))
//!     .await?;
//! println!("{}: {}", result.status, result.body.text());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod downcache;
pub mod errors;
pub mod fetch;
pub mod limiter;
pub mod observer;

pub use cache::to_path;
pub use config::{Config, ConfigUpdate, LogLevel};
pub use downcache::Downcache;
pub use errors::{DowncacheError, Result};
pub use fetch::{Body, FetchRequest, FetchResult, FetchStatus, RetrieveOptions};
