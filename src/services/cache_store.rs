//! Named cache buckets mapping request URLs to stored responses

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;
use url::Url;

use crate::{
    error::{Result, WorkerError},
    protocol::Response,
};

/// Storage for versioned cache buckets
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create `bucket` if it does not exist yet
    async fn open(&self, bucket: &str) -> Result<()>;

    /// Names of every existing bucket
    async fn keys(&self) -> Result<Vec<String>>;

    /// Remove a bucket; returns whether it existed
    async fn delete(&self, bucket: &str) -> Result<bool>;

    /// Exact-match lookup, ignoring the URL fragment
    async fn match_url(&self, bucket: &str, url: &Url) -> Result<Option<Response>>;

    /// Store one entry, creating the bucket if needed
    async fn put(&self, bucket: &str, url: &Url, response: Response) -> Result<()>;

    /// Store a batch of entries at once; either all land or none do
    async fn put_all(&self, bucket: &str, entries: Vec<(Url, Response)>) -> Result<()>;

    /// URLs stored in a bucket
    async fn urls(&self, bucket: &str) -> Result<Vec<String>>;
}

/// Key under which a URL is stored. Fragments never reach the network, so
/// they do not distinguish entries.
pub fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

type Bucket = BTreeMap<String, Response>;

/// Process-local store; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    buckets: Mutex<BTreeMap<String, Bucket>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_buckets<T>(&self, f: impl FnOnce(&mut BTreeMap<String, Bucket>) -> T) -> T {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut buckets)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn open(&self, bucket: &str) -> Result<()> {
        self.with_buckets(|b| {
            b.entry(bucket.to_string()).or_default();
        });
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.with_buckets(|b| b.keys().cloned().collect()))
    }

    async fn delete(&self, bucket: &str) -> Result<bool> {
        Ok(self.with_buckets(|b| b.remove(bucket).is_some()))
    }

    async fn match_url(&self, bucket: &str, url: &Url) -> Result<Option<Response>> {
        let key = cache_key(url);
        Ok(self.with_buckets(|b| b.get(bucket).and_then(|entries| entries.get(&key).cloned())))
    }

    async fn put(&self, bucket: &str, url: &Url, response: Response) -> Result<()> {
        let key = cache_key(url);
        self.with_buckets(|b| {
            b.entry(bucket.to_string()).or_default().insert(key, response);
        });
        Ok(())
    }

    async fn put_all(&self, bucket: &str, entries: Vec<(Url, Response)>) -> Result<()> {
        self.with_buckets(|b| {
            let target = b.entry(bucket.to_string()).or_default();
            for (url, response) in entries {
                target.insert(cache_key(&url), response);
            }
        });
        Ok(())
    }

    async fn urls(&self, bucket: &str) -> Result<Vec<String>> {
        Ok(self.with_buckets(|b| {
            b.get(bucket)
                .map(|entries| entries.keys().cloned().collect())
                .unwrap_or_default()
        }))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct BucketFile {
    name: String,
    entries: Bucket,
}

/// Store that keeps one JSON file per bucket so cached assets survive restarts
#[derive(Debug)]
pub struct DiskCacheStore {
    cache_dir: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl DiskCacheStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Hex-encoded so distinct bucket names never share a file
    fn bucket_path(&self, bucket: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", hex::encode(bucket.as_bytes())))
    }

    async fn load(&self, bucket: &str) -> Result<Option<BucketFile>> {
        let path = self.bucket_path(bucket);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: BucketFile = serde_json::from_str(&contents)
            .map_err(|e| WorkerError::Cache(format!("Failed to parse bucket {}: {}", bucket, e)))?;
        Ok(Some(file))
    }

    async fn save(&self, file: &BucketFile) -> Result<()> {
        let path = self.bucket_path(&file.name);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(file)?).await?;
        fs::rename(&tmp, &path).await?;
        debug!("Wrote cache bucket {} ({} entries)", file.name, file.entries.len());
        Ok(())
    }

    async fn update(&self, bucket: &str, f: impl FnOnce(&mut Bucket) + Send) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.load(bucket).await?.unwrap_or_else(|| BucketFile {
            name: bucket.to_string(),
            entries: Bucket::new(),
        });
        f(&mut file.entries);
        self.save(&file).await
    }
}

#[async_trait]
impl CacheStore for DiskCacheStore {
    async fn open(&self, bucket: &str) -> Result<()> {
        self.update(bucket, |_| {}).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = fs::read_dir(&self.cache_dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let contents = fs::read_to_string(&path).await?;
            let file: BucketFile = serde_json::from_str(&contents).map_err(|e| {
                WorkerError::Cache(format!("Failed to parse {}: {}", path.display(), e))
            })?;
            names.push(file.name);
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, bucket: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.bucket_path(bucket)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn match_url(&self, bucket: &str, url: &Url) -> Result<Option<Response>> {
        let key = cache_key(url);
        Ok(self
            .load(bucket)
            .await?
            .and_then(|mut file| file.entries.remove(&key)))
    }

    async fn put(&self, bucket: &str, url: &Url, response: Response) -> Result<()> {
        let key = cache_key(url);
        self.update(bucket, move |entries| {
            entries.insert(key, response);
        })
        .await
    }

    async fn put_all(&self, bucket: &str, entries: Vec<(Url, Response)>) -> Result<()> {
        self.update(bucket, move |target| {
            for (url, response) in entries {
                target.insert(cache_key(&url), response);
            }
        })
        .await
    }

    async fn urls(&self, bucket: &str) -> Result<Vec<String>> {
        Ok(self
            .load(bucket)
            .await?
            .map(|file| file.entries.into_keys().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn url(path: &str) -> Url {
        Url::parse("https://app.example/").unwrap().join(path).unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_ignores_fragment() {
        let store = MemoryCacheStore::new();
        store
            .put("v1", &url("index.html"), Response::ok("text/html", "<html>"))
            .await
            .unwrap();

        let hit = store.match_url("v1", &url("index.html#cronometro")).await.unwrap();
        assert!(hit.is_some());
        assert!(store.match_url("v2", &url("index.html")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disk_store_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = DiskCacheStore::new(dir.path().to_path_buf()).unwrap();
            store
                .put_all(
                    "hypertrofia-cache-v1",
                    vec![(url("icon.png"), Response::ok("image/png", vec![1, 2, 3]))],
                )
                .await
                .unwrap();
            store.open("old/cache").await.unwrap();
        }

        let store = DiskCacheStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.keys().await.unwrap(), vec!["hypertrofia-cache-v1", "old/cache"]);

        let icon = store
            .match_url("hypertrofia-cache-v1", &url("icon.png"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(icon.body, vec![1, 2, 3]);

        assert!(store.delete("old/cache").await.unwrap());
        assert!(!store.delete("old/cache").await.unwrap());
        assert_eq!(store.keys().await.unwrap(), vec!["hypertrofia-cache-v1"]);
    }

    #[tokio::test]
    async fn test_disk_store_keeps_similar_names_apart() {
        let dir = tempdir().unwrap();
        let store = DiskCacheStore::new(dir.path().to_path_buf()).unwrap();
        store
            .put("old/cache", &url("a.js"), Response::ok("text/javascript", "slash"))
            .await
            .unwrap();
        store
            .put("old_cache", &url("a.js"), Response::ok("text/javascript", "underscore"))
            .await
            .unwrap();

        assert_eq!(store.keys().await.unwrap(), vec!["old/cache", "old_cache"]);
        let slash = store.match_url("old/cache", &url("a.js")).await.unwrap().unwrap();
        assert_eq!(slash.body, b"slash");

        assert!(store.delete("old_cache").await.unwrap());
        assert_eq!(store.keys().await.unwrap(), vec!["old/cache"]);
    }
}
