//! Cache path computation.

use url::Url;

use crate::errors::{DowncacheError, Result};

/// Parse a URL, requiring a host.
pub fn parse_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| DowncacheError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(DowncacheError::InvalidUrl {
            url: url.to_string(),
            reason: "URL has no host".to_string(),
        });
    }
    Ok(parsed)
}

/// Compute the relative cache path for a URL.
///
/// The path is `{host}/{url path}` with empty segments dropped, so
/// `http://host.com/foo/` and `http://host.com/foo` share `host.com/foo`.
///
/// The query string and fragment are not part of the path: URLs that differ
/// only there map to the same cache file.
///
/// Example:
/// - URL: `https://api.example.com/v1/items/?page=2`
/// - Path: `api.example.com/v1/items`
pub fn to_path(url: &str) -> Result<String> {
    let parsed = parse_url(url)?;
    Ok(url_to_path(&parsed))
}

/// Same as [`to_path`] for an already-parsed URL with a host.
pub(crate) fn url_to_path(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    let mut path = String::from(host);
    for segment in url.path().split('/').filter(|s| !s.is_empty()) {
        path.push('/');
        path.push_str(segment);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_is_deterministic() {
        let url = "https://example.com/data/items.json";
        assert_eq!(to_path(url).unwrap(), to_path(url).unwrap());
        assert_eq!(to_path(url).unwrap(), "example.com/data/items.json");
    }

    #[test]
    fn test_trailing_separator_removed() {
        assert_eq!(
            to_path("http://host.com/foo/").unwrap(),
            to_path("http://host.com/foo").unwrap()
        );
        assert_eq!(to_path("http://host.com/foo/").unwrap(), "host.com/foo");
    }

    #[test]
    fn test_host_root() {
        assert_eq!(to_path("http://host.com").unwrap(), "host.com");
        assert_eq!(to_path("http://host.com/").unwrap(), "host.com");
    }

    #[test]
    fn test_query_and_fragment_dropped() {
        assert_eq!(
            to_path("http://host.com/search?q=rust#top").unwrap(),
            "host.com/search"
        );
        assert_eq!(
            to_path("http://host.com/search?q=a").unwrap(),
            to_path("http://host.com/search?q=b").unwrap()
        );
    }

    #[test]
    fn test_empty_segments_collapsed() {
        assert_eq!(to_path("http://host.com/a//b/").unwrap(), "host.com/a/b");
    }

    #[test]
    fn test_port_not_in_path() {
        assert_eq!(
            to_path("http://localhost:8080/api").unwrap(),
            "localhost/api"
        );
    }

    #[test]
    fn test_invalid_urls() {
        assert!(matches!(
            to_path("not a url"),
            Err(DowncacheError::InvalidUrl { .. })
        ));
        assert!(matches!(
            to_path("mailto:someone@example.com"),
            Err(DowncacheError::InvalidUrl { .. })
        ));
        assert!(matches!(
            to_path("/relative/path"),
            Err(DowncacheError::InvalidUrl { .. })
        ));
    }
}
