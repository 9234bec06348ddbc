//! Request and result types for cache retrieval

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use reqwest::header::HeaderMap;
use serde::Serialize;

/// How a retrieve call produced its body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Served from a non-empty cache file, no live fetch
    FromCache,
    /// Fetched live and written to the cache
    FetchedAndCached,
    /// Fetched live, cache write skipped on request
    FetchedNotCached,
    /// Fetched live but the cache write failed
    Error,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FetchStatus::FromCache => "retrieved from cache",
            FetchStatus::FetchedAndCached => "retrieved live and cached",
            FetchStatus::FetchedNotCached => "retrieved live, not cached",
            FetchStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Response body, raw or decoded
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Bytes exactly as fetched or stored
    Raw(Vec<u8>),
    /// Body decoded as JSON
    Json(serde_json::Value),
}

impl Body {
    /// Raw bytes, if the body was not decoded
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Raw(bytes) => Some(bytes),
            Body::Json(_) => None,
        }
    }

    /// Decoded JSON value, if the body was decoded
    pub fn json(&self) -> Option<&serde_json::Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Raw(_) => None,
        }
    }

    /// Body as text (lossy for non-UTF-8 bytes)
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Body::Raw(bytes) => String::from_utf8_lossy(bytes),
            Body::Json(value) => Cow::Owned(value.to_string()),
        }
    }
}

/// Raw response handed back by a [`super::Fetcher`]
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// HTTP status code after redirects
    pub status_code: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Full response body
    pub body: Vec<u8>,
}

/// Outcome of a successful retrieve
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: FetchStatus,
    pub url: String,
    /// Cache file path (base directory included)
    pub path: PathBuf,
    pub body: Body,
    /// Present only for live fetches
    pub status_code: Option<u16>,
    /// Present only for live fetches
    pub headers: Option<HeaderMap>,
}

/// Per-call options layered over the orchestrator's config
#[derive(Debug, Clone, Default)]
pub struct RetrieveOptions {
    /// Explicit cache path relative to the base directory
    pub path: Option<PathBuf>,
    /// Ignore any cached body and call live
    pub force: bool,
    /// Don't write the fetched body to the cache
    pub no_cache: bool,
    /// Decode the body as JSON before returning it
    pub json: bool,
    /// Base directory override
    pub directory: Option<PathBuf>,
    /// Rate limit in milliseconds; carried with the request but live fetches
    /// always draw from the instance's configured bucket
    pub rate_limit: Option<u64>,
}

/// A fully-formed retrieve request
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub options: RetrieveOptions,
}

impl FetchRequest {
    /// Request with default options
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            options: RetrieveOptions::default(),
        }
    }

    pub fn with_options(url: impl Into<String>, options: RetrieveOptions) -> Self {
        Self {
            url: url.into(),
            options,
        }
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.path = Some(path.into());
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.options.force = force;
        self
    }

    pub fn no_cache(mut self, no_cache: bool) -> Self {
        self.options.no_cache = no_cache;
        self
    }

    pub fn json(mut self, json: bool) -> Self {
        self.options.json = json;
        self
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.options.directory = Some(directory.into());
        self
    }

    pub fn rate_limit(mut self, millis: u64) -> Self {
        self.options.rate_limit = Some(millis);
        self
    }
}

impl From<&str> for FetchRequest {
    fn from(url: &str) -> Self {
        FetchRequest::new(url)
    }
}

impl From<String> for FetchRequest {
    fn from(url: String) -> Self {
        FetchRequest::new(url)
    }
}
