//! Live fetch capability and retrieve request/result types

pub mod client;
pub mod types;

pub use client::{Fetcher, ReqwestFetcher, TransportError};
pub use types::*;
