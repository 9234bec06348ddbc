//! Downcache error types
//!
//! One error per way a retrieve can end without a usable result. Errors that
//! happen after a successful live fetch carry the fetched data so callers can
//! still use it.

use std::path::PathBuf;

use crate::fetch::{FetchResult, FetchedResponse, TransportError};

/// Errors surfaced by [`crate::Downcache`] operations
#[derive(Debug, thiserror::Error)]
pub enum DowncacheError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Rate limited: {url}")]
    RateLimited { url: String },

    #[error("Fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("Bad response code {} for {url}", .response.status_code)]
    BadStatus {
        url: String,
        response: Box<FetchedResponse>,
    },

    #[error("Storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        /// Result of the live fetch whose body could not be written
        fetched: Option<Box<FetchResult>>,
    },

    #[error("Couldn't parse response as JSON: {source}")]
    Parse {
        /// Raw body text that failed to parse
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl DowncacheError {
    /// Whether the call was rejected by the rate limiter before any fetch
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, DowncacheError::RateLimited { .. })
    }

    /// Fetched result carried by a storage failure after a successful fetch
    pub fn fetched(&self) -> Option<&FetchResult> {
        match self {
            DowncacheError::Storage { fetched, .. } => fetched.as_deref(),
            _ => None,
        }
    }

    /// Raw body text carried by the error, if any
    pub fn raw_body(&self) -> Option<String> {
        match self {
            DowncacheError::Parse { body, .. } => Some(body.clone()),
            DowncacheError::BadStatus { response, .. } => {
                Some(String::from_utf8_lossy(&response.body).into_owned())
            }
            DowncacheError::Storage {
                fetched: Some(result),
                ..
            } => Some(result.body.text().into_owned()),
            _ => None,
        }
    }

    /// Map a storage failure into an error, attaching the fetched result if any
    pub(crate) fn storage(
        path: impl Into<PathBuf>,
        source: std::io::Error,
        fetched: Option<FetchResult>,
    ) -> Self {
        DowncacheError::Storage {
            path: path.into(),
            source,
            fetched: fetched.map(Box::new),
        }
    }
}

/// Result alias for downcache operations
pub type Result<T> = std::result::Result<T, DowncacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Body, FetchStatus};
    use reqwest::header::HeaderMap;

    #[test]
    fn test_bad_status_message_and_body() {
        let err = DowncacheError::BadStatus {
            url: "http://example.com/missing".to_string(),
            response: Box::new(FetchedResponse {
                status_code: 404,
                headers: HeaderMap::new(),
                body: b"not here".to_vec(),
            }),
        };
        assert_eq!(
            err.to_string(),
            "Bad response code 404 for http://example.com/missing"
        );
        assert_eq!(err.raw_body().as_deref(), Some("not here"));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_storage_error_carries_fetched_result() {
        let fetched = FetchResult {
            status: FetchStatus::Error,
            url: "http://example.com/a".to_string(),
            path: PathBuf::from("cache/example.com/a"),
            body: Body::Raw(b"payload".to_vec()),
            status_code: Some(200),
            headers: None,
        };
        let err = DowncacheError::storage(
            "cache/example.com/a",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            Some(fetched),
        );
        let carried = err.fetched().unwrap();
        assert_eq!(carried.status, FetchStatus::Error);
        assert_eq!(carried.body.as_bytes(), Some(&b"payload"[..]));
        assert_eq!(err.raw_body().as_deref(), Some("payload"));
    }
}
