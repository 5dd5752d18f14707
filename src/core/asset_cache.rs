//! URL-addressed asset cache.
//!
//! Remote images are stored beside the documents that reference them, under
//! `<document dir>/assets/<sha1(url)><ext>`. The key is derived from the URL
//! string, never from the fetched bytes, so a URL whose file already exists is
//! not fetched again even if the remote content changed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha1::{Digest, Sha1};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::adapters::{FetchError, Fetcher};

/// Extension used when the URL path has none
pub const DEFAULT_EXTENSION: &str = ".png";

/// Errors resolving a URL to a cached file
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to write asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{url} is not cached and fetching is disabled")]
    Offline { url: String },
}

/// Maps remote URLs to local files, fetching on miss
pub struct AssetCache {
    /// Remote byte source
    fetcher: Arc<dyn Fetcher>,

    /// Refuse to fetch on a miss
    offline: bool,

    /// One lock per target file so a URL is fetched at most once
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl AssetCache {
    /// Create a cache backed by a fetcher
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            offline: false,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Only resolve URLs that are already cached
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Resolve `url` to a file inside `asset_dir`, fetching it if absent.
    ///
    /// Failures are logged here and returned to the caller, which leaves the
    /// reference alone.
    pub async fn resolve(&self, url: &str, asset_dir: &Path) -> Result<PathBuf, CacheError> {
        match self.resolve_inner(url, asset_dir).await {
            Ok(path) => Ok(path),
            Err(CacheError::Offline { url }) => {
                debug!(%url, "Not cached, skipping (offline)");
                Err(CacheError::Offline { url })
            }
            Err(e) => {
                warn!("Failed to download {}: {}", url, e);
                Err(e)
            }
        }
    }

    async fn resolve_inner(&self, url: &str, asset_dir: &Path) -> Result<PathBuf, CacheError> {
        let target = asset_dir.join(asset_file_name(url));

        let lock = self.lock_for(&target).await;
        let _guard = lock.lock().await;

        if target.exists() {
            debug!(%url, path = %target.display(), "Cache hit");
            return Ok(target);
        }

        if self.offline {
            return Err(CacheError::Offline {
                url: url.to_string(),
            });
        }

        fs::create_dir_all(asset_dir)
            .await
            .map_err(|source| CacheError::Io {
                path: asset_dir.to_path_buf(),
                source,
            })?;

        info!("Downloading {} -> {}", url, target.display());
        let bytes = self.fetcher.fetch(url).await?;
        write_atomic(&target, &bytes).await?;

        Ok(target)
    }

    async fn lock_for(&self, target: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(target.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Write to a `.part` sibling, then rename over the target.
///
/// The target either does not exist or holds the complete body.
async fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let mut partial = target.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    if let Err(source) = fs::write(&partial, bytes).await {
        let _ = fs::remove_file(&partial).await;
        return Err(CacheError::Io {
            path: partial,
            source,
        });
    }

    if let Err(source) = fs::rename(&partial, target).await {
        let _ = fs::remove_file(&partial).await;
        return Err(CacheError::Io {
            path: target.to_path_buf(),
            source,
        });
    }

    Ok(())
}

/// SHA-1 hex digest of the URL string
pub fn asset_key(url: &str) -> String {
    hex::encode(Sha1::digest(url.as_bytes()))
}

/// Extension of the URL's last path segment (with the dot), or `.png`.
///
/// Query strings and fragments are not part of the extension.
pub fn asset_extension(url: &str) -> String {
    let segment = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_string),
    };

    segment
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// `<sha1(url)><ext>`
pub fn asset_file_name(url: &str) -> String {
    format!("{}{}", asset_key(url), asset_extension(url))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;

    /// Answers every request with the same bytes and counts the calls
    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(b"IMG".to_vec())
        }
    }

    const URL: &str = "https://example.com/a/b.jpg";

    #[tokio::test]
    async fn test_miss_fetches_and_creates_asset_dir() {
        let temp = TempDir::new().unwrap();
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = AssetCache::new(fetcher.clone());
        let asset_dir = temp.path().join("assets");

        let path = cache.resolve(URL, &asset_dir).await.unwrap();
        let again = cache.resolve(URL, &asset_dir).await.unwrap();

        assert_eq!(path, asset_dir.join(asset_file_name(URL)));
        assert_eq!(path, again);
        assert_eq!(std::fs::read(&path).unwrap(), b"IMG");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_offline_miss_leaves_no_asset_dir() {
        let temp = TempDir::new().unwrap();
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = AssetCache::new(fetcher.clone()).offline(true);
        let asset_dir = temp.path().join("assets");

        let err = cache.resolve(URL, &asset_dir).await.unwrap_err();

        assert!(matches!(err, CacheError::Offline { .. }));
        assert!(!asset_dir.exists());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_offline_hit_is_served() {
        let temp = TempDir::new().unwrap();
        let asset_dir = temp.path().join("assets");
        std::fs::create_dir_all(&asset_dir).unwrap();
        std::fs::write(asset_dir.join(asset_file_name(URL)), b"OLD").unwrap();
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = AssetCache::new(fetcher.clone()).offline(true);

        let path = cache.resolve(URL, &asset_dir).await.unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"OLD");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_asset_key_is_sha1_hex() {
        // sha1("abc")
        assert_eq!(asset_key("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(asset_key("https://example.com/a/b.jpg").len(), 40);
    }

    #[test]
    fn test_asset_extension_from_path() {
        assert_eq!(asset_extension("https://example.com/a/b.jpg"), ".jpg");
        assert_eq!(asset_extension("http://x/y.png"), ".png");
        assert_eq!(asset_extension("https://example.com/pic.webp?w=200#top"), ".webp");
        assert_eq!(asset_extension("https://example.com/archive.tar.gz"), ".gz");
    }

    #[test]
    fn test_asset_extension_defaults_to_png() {
        assert_eq!(asset_extension("https://example.com/image"), ".png");
        assert_eq!(asset_extension("https://example.com/"), ".png");
        assert_eq!(asset_extension("https://example.com"), ".png");
        assert_eq!(asset_extension("https://example.com/.hidden"), ".png");
        assert_eq!(asset_extension("https://example.com/dir.v2/render?fmt=a.jpg"), ".png");
    }

    #[test]
    fn test_asset_file_name() {
        let url = "https://example.com/a/b.jpg";
        assert_eq!(asset_file_name(url), format!("{}.jpg", asset_key(url)));
    }
}
