//! Two-tier image byte cache.
//!
//! Images are keyed by URL. The memory tier is a bounded LRU of raw bytes; the disk tier is a
//! directory of files named by the SHA-256 hex digest of the URL. Lookups fall through memory,
//! then disk, then the network.
//!
//! Every clear bumps an epoch. A download or disk promotion that started under an older epoch is
//! not written back, so a clear is never undone by work that was already in flight.

use bytes::Bytes;
use lru::LruCache;
use reqwest::header;
use roost_core::{AppConfig, Error, ImageCache};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::ClientError;

/// Images kept in memory unless configured otherwise.
pub const DEFAULT_MEMORY_ENTRIES: usize = 200;

struct MemoryTier {
    entries: LruCache<String, Bytes>,
    epoch: u64,
}

impl MemoryTier {
    fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { entries: LruCache::new(capacity), epoch: 0 }
    }
}

/// Memory and disk cache for listing images.
pub struct ImageStore {
    http: reqwest::Client,
    dir: PathBuf,
    memory: Mutex<MemoryTier>,
}

impl fmt::Debug for ImageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageStore").field("dir", &self.dir).finish_non_exhaustive()
    }
}

impl ImageStore {
    /// Create a store that keeps its disk tier under `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>, user_agent: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ClientError::Network(Arc::new(e)))?;

        Ok(Self { http, dir: dir.into(), memory: Mutex::new(MemoryTier::new(DEFAULT_MEMORY_ENTRIES)) })
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self, ClientError> {
        Ok(Self::new(&config.image_cache_dir, &config.user_agent, config.timeout())?
            .with_memory_entries(config.image_memory_entries))
    }

    /// Bound the memory tier to `entries` images (at least one). Least recently used go first.
    pub fn with_memory_entries(mut self, entries: usize) -> Self {
        self.memory = Mutex::new(MemoryTier::new(entries));
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        self.dir.join(hex::encode(hasher.finalize()))
    }

    /// Cached bytes for `url`, promoting disk hits into memory.
    pub async fn get(&self, url: &str) -> Result<Option<Bytes>, ClientError> {
        let epoch = {
            let mut memory = self.memory.lock().await;
            if let Some(bytes) = memory.entries.get(url) {
                return Ok(Some(bytes.clone()));
            }
            memory.epoch
        };

        match tokio::fs::read(self.file_for(url)).await {
            Ok(data) => {
                let bytes = Bytes::from(data);
                let mut memory = self.memory.lock().await;
                if memory.epoch == epoch {
                    memory.entries.put(url.to_string(), bytes.clone());
                }
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Put bytes in both tiers.
    pub async fn store(&self, url: &str, bytes: Bytes) -> Result<(), ClientError> {
        let epoch = self.memory.lock().await.epoch;
        self.store_at(url, bytes, epoch).await?;
        Ok(())
    }

    /// Write both tiers unless a clear has happened since `epoch`. Returns whether it wrote.
    async fn store_at(&self, url: &str, bytes: Bytes, epoch: u64) -> Result<bool, ClientError> {
        let mut memory = self.memory.lock().await;
        if memory.epoch != epoch {
            tracing::debug!("discarding image fetched before a cache clear: {}", url);
            return Ok(false);
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.file_for(url), &bytes).await?;
        memory.entries.put(url.to_string(), bytes);
        Ok(true)
    }

    /// Cached bytes for `url`, downloading and storing them on a miss.
    pub async fn get_or_fetch(&self, url: &str) -> Result<Bytes, ClientError> {
        if let Some(bytes) = self.get(url).await? {
            return Ok(bytes);
        }

        let epoch = self.memory.lock().await.epoch;
        tracing::debug!("downloading image: {}", url);
        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "image/*")
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ClientError::HttpError { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        self.store_at(url, bytes.clone(), epoch).await?;
        Ok(bytes)
    }

    /// Warm the cache for every URL. Failures are logged and skipped; returns how many were fetched.
    pub async fn prefetch<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cached = 0;
        for url in urls {
            match self.get_or_fetch(url.as_ref()).await {
                Ok(_) => cached += 1,
                Err(e) => tracing::warn!("image prefetch failed for {}: {}", url.as_ref(), e),
            }
        }
        cached
    }

    /// Number of images held in memory.
    pub async fn memory_len(&self) -> usize {
        self.memory.lock().await.entries.len()
    }

    pub async fn memory_size(&self) -> u64 {
        self.memory
            .lock()
            .await
            .entries
            .iter()
            .map(|(_, bytes)| bytes.len() as u64)
            .sum()
    }

    /// Bytes held in the disk directory. A missing directory is empty.
    pub async fn disk_size(&self) -> Result<u64, ClientError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut total = 0;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                total += metadata.len();
            }
        }
        Ok(total)
    }

    pub async fn clear_memory(&self) {
        let mut memory = self.memory.lock().await;
        memory.epoch += 1;
        memory.entries.clear();
    }

    pub async fn clear_disk(&self) -> Result<(), ClientError> {
        let mut memory = self.memory.lock().await;
        memory.epoch += 1;
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn image_error(err: ClientError) -> Error {
    Error::ImageCache(err.to_string())
}

#[async_trait::async_trait]
impl ImageCache for ImageStore {
    async fn clear_memory(&self) -> Result<(), Error> {
        ImageStore::clear_memory(self).await;
        Ok(())
    }

    async fn clear_disk(&self) -> Result<(), Error> {
        ImageStore::clear_disk(self).await.map_err(image_error)
    }

    /// Memory plus disk bytes. An image present in both tiers counts twice.
    async fn size(&self) -> Result<u64, Error> {
        let disk = self.disk_size().await.map_err(image_error)?;
        Ok(self.memory_size().await + disk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn store_in(dir: &Path) -> ImageStore {
        ImageStore::new(dir.join("images"), "roost-test", Duration::from_secs(5)).unwrap()
    }

    /// Serves `body` to a single GET request.
    async fn serve_image(body: &'static [u8]) -> String {
        serve_image_after(body, Duration::ZERO).await
    }

    /// Like `serve_image`, but holds the response back for `delay`.
    async fn serve_image_after(body: &'static [u8], delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }
            tokio::time::sleep(delay).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}/pictures/1.jpg")
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        assert!(store.get("https://img.example.com/1.jpg").await.unwrap().is_none());

        store.store("https://img.example.com/1.jpg", Bytes::from_static(b"jpeg")).await.unwrap();
        let bytes = store.get("https://img.example.com/1.jpg").await.unwrap().unwrap();
        assert_eq!(&bytes[..], b"jpeg");
    }

    #[tokio::test]
    async fn test_disk_hit_after_memory_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        store.store("https://img.example.com/1.jpg", Bytes::from_static(b"jpeg")).await.unwrap();

        store.clear_memory().await;
        assert_eq!(store.memory_size().await, 0);

        let bytes = store.get("https://img.example.com/1.jpg").await.unwrap().unwrap();
        assert_eq!(&bytes[..], b"jpeg");
        assert_eq!(store.memory_size().await, 4);
    }

    #[tokio::test]
    async fn test_file_named_by_url_digest() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        store.store("https://img.example.com/1.jpg", Bytes::from_static(b"jpeg")).await.unwrap();

        let name = store.file_for("https://img.example.com/1.jpg");
        let name = name.file_name().unwrap().to_str().unwrap();
        assert_eq!(name.len(), 64);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(store.dir().join(name).exists());
    }

    #[tokio::test]
    async fn test_sizes_and_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        assert_eq!(store.disk_size().await.unwrap(), 0);

        store.store("a", Bytes::from_static(b"12345")).await.unwrap();
        store.store("b", Bytes::from_static(b"678")).await.unwrap();

        assert_eq!(store.memory_size().await, 8);
        assert_eq!(store.disk_size().await.unwrap(), 8);
        assert_eq!(ImageCache::size(&store).await.unwrap(), 16);

        ImageCache::clear_memory(&store).await.unwrap();
        ImageCache::clear_disk(&store).await.unwrap();
        assert_eq!(ImageCache::size(&store).await.unwrap(), 0);
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_disk_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        assert!(store.clear_disk().await.is_ok());
    }

    #[tokio::test]
    async fn test_get_or_fetch_downloads_once() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let url = serve_image(b"\xff\xd8image").await;

        let bytes = store.get_or_fetch(&url).await.unwrap();
        assert_eq!(&bytes[..], b"\xff\xd8image");

        // The stub only answers once, so a second call must come from the cache.
        let again = store.get_or_fetch(&url).await.unwrap();
        assert_eq!(bytes, again);
    }

    #[tokio::test]
    async fn test_prefetch_skips_failures() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let url = serve_image(b"jpeg").await;

        let cached = store.prefetch([url.as_str(), "http://127.0.0.1:9/unreachable.jpg"]).await;
        assert_eq!(cached, 1);
        assert!(store.get(&url).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_memory_tier_evicts_least_recently_used() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path()).with_memory_entries(2);

        store.store("a", Bytes::from_static(b"1")).await.unwrap();
        store.store("b", Bytes::from_static(b"22")).await.unwrap();
        store.get("a").await.unwrap();
        store.store("c", Bytes::from_static(b"4444")).await.unwrap();

        assert_eq!(store.memory_len().await, 2);
        assert_eq!(store.memory_size().await, 5);
        assert_eq!(store.disk_size().await.unwrap(), 7);

        let b = store.get("b").await.unwrap().unwrap();
        assert_eq!(&b[..], b"22");
        assert_eq!(store.memory_len().await, 2);
        assert_eq!(store.memory_size().await, 6);
    }

    #[tokio::test]
    async fn test_clear_during_download_discards_late_image() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(tmp.path()));
        let url = serve_image_after(b"late-jpeg", Duration::from_millis(300)).await;

        let fetch = tokio::spawn({
            let store = Arc::clone(&store);
            let url = url.clone();
            async move { store.get_or_fetch(&url).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        ImageCache::clear_memory(store.as_ref()).await.unwrap();
        ImageCache::clear_disk(store.as_ref()).await.unwrap();

        let bytes = fetch.await.unwrap().unwrap();
        assert_eq!(&bytes[..], b"late-jpeg");
        assert_eq!(ImageCache::size(store.as_ref()).await.unwrap(), 0);
        assert!(store.get(&url).await.unwrap().is_none());
    }
}
