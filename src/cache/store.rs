//! Local Body Cache
//!
//! Stores fetched bodies on local disk, one plain file per cache path.
//! An empty file counts as a miss so a zero-byte placeholder heals itself on
//! the next fetch.

use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

/// Filesystem primitives the cache needs
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the whole file. `Ok(None)` when it doesn't exist.
    async fn read_all(&self, path: &Path) -> io::Result<Option<Vec<u8>>>;

    /// Replace the file's content with `data`.
    async fn write_all(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Create `path` and all missing parents.
    async fn make_dirs(&self, path: &Path) -> io::Result<()>;
}

/// Local filesystem storage
///
/// Writes land in a temp file beside the target and are renamed into place.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

#[async_trait]
impl Storage for FsStorage {
    async fn read_all(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write_all(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let local_path = path.to_path_buf();
        let data = data.to_vec();

        // tempfile is sync, keep it off the runtime threads
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let parent = match local_path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
            tmp.write_all(&data)?;
            tmp.persist(&local_path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(io::Error::other)?
    }

    async fn make_dirs(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }
}

/// Read/write of cached bodies on top of a [`Storage`]
#[derive(Clone)]
pub struct CacheStore {
    storage: Arc<dyn Storage>,
}

impl CacheStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Read a cached body
    ///
    /// # Returns
    /// Some(body) for a non-empty file, None if absent, empty, or unreadable
    pub async fn read(&self, path: &Path) -> Option<Vec<u8>> {
        match self.storage.read_all(path).await {
            Ok(Some(body)) if !body.is_empty() => {
                debug!(path = %path.display(), size = body.len(), "Body cache HIT");
                Some(body)
            }
            Ok(Some(_)) => {
                debug!(path = %path.display(), "Empty file in body cache, treating as MISS");
                None
            }
            Ok(None) => {
                debug!(path = %path.display(), "Body cache MISS");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read cached body, treating as MISS");
                None
            }
        }
    }

    /// Write a body, creating parent directories as needed
    pub async fn write(&self, path: &Path, body: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.storage.make_dirs(parent).await?;
        }

        self.storage.write_all(path, body).await?;

        debug!(path = %path.display(), size = body.len(), "Stored body in cache");
        Ok(())
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(Arc::new(FsStorage))
    }
}

/// Join a relative cache path under a base directory
///
/// Only normal segments of `relative` are kept: root, prefix, `.` and `..`
/// components are dropped so the result stays under the base directory.
pub fn cache_file_path(base_directory: &Path, relative: &Path) -> PathBuf {
    let mut path = base_directory.to_path_buf();
    for component in relative.components() {
        if let Component::Normal(segment) = component {
            path.push(segment);
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_missing_file_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::default();
        assert!(store.read(&dir.path().join("nope")).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_file_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        let store = CacheStore::default();
        assert!(store.read(&path).await.is_none());
    }

    #[tokio::test]
    async fn test_write_creates_parents_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.com/a/b/c");

        let store = CacheStore::default();
        store.write(&path, b"body").await.unwrap();

        assert_eq!(store.read(&path).await.unwrap(), b"body");
        // Only the target remains, no leftover temp files
        assert_eq!(file_count(path.parent().unwrap()), 1);
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host/file");

        let store = CacheStore::default();
        store.write(&path, b"first, longer body").await.unwrap();
        store.write(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_write_error_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is needed
        std::fs::write(dir.path().join("blocker"), b"x").unwrap();
        let path = dir.path().join("blocker/child/file");

        let store = CacheStore::default();
        assert!(store.write(&path, b"body").await.is_err());
    }

    #[test]
    fn test_cache_file_path() {
        let base = Path::new("./cache/");
        assert_eq!(
            cache_file_path(base, Path::new("host.com/foo")),
            PathBuf::from("./cache/host.com/foo")
        );
        assert_eq!(
            cache_file_path(base, Path::new("/custom/file.json")),
            PathBuf::from("./cache/custom/file.json")
        );
    }

    #[test]
    fn test_cache_file_path_stays_under_base() {
        let base = Path::new("/data/cache");
        assert_eq!(
            cache_file_path(base, Path::new("../outside")),
            PathBuf::from("/data/cache/outside")
        );
        assert_eq!(
            cache_file_path(base, Path::new("a/../../b/./c")),
            PathBuf::from("/data/cache/a/b/c")
        );
        assert!(cache_file_path(base, Path::new("../../etc/passwd")).starts_with(base));
    }
}
