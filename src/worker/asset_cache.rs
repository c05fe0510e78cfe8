//! Cache-first asset serving with versioned buckets

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, warn};
use url::{Origin, Url};

use crate::{
    error::{Result, WorkerError},
    protocol::{Request, Response},
    services::{CacheStore, ClientRegistry, Fetcher},
};

/// Bucket name for the current asset set; bump it to ship new assets
pub const CACHE_NAME: &str = "hypertrofia-cache-v1";

/// Application shell cached at install time
pub const APP_ASSETS: [&str; 4] = ["./", "./index.html", "./manifest.json", "./icon.png"];

/// Document served when the network is unavailable
pub const ENTRY_DOCUMENT: &str = "./index.html";

/// Owns the current cache bucket across the install, activate and fetch events
pub struct AssetCacheManager {
    cache: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<dyn ClientRegistry>,
    cache_name: String,
    origin: Origin,
    manifest: Vec<Url>,
    entry_document: Url,
}

impl AssetCacheManager {
    /// Manager for the app served under `scope`, caching into `cache_name`
    pub fn new(
        scope: &Url,
        cache_name: &str,
        cache: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        clients: Arc<dyn ClientRegistry>,
    ) -> Result<Self> {
        Ok(Self {
            cache,
            fetcher,
            clients,
            cache_name: cache_name.to_string(),
            origin: scope.origin(),
            manifest: resolve_all(scope, &APP_ASSETS)?,
            entry_document: scope.join(ENTRY_DOCUMENT)?,
        })
    }

    /// Replace the install manifest with other relative URLs
    pub fn with_manifest(mut self, scope: &Url, assets: &[&str]) -> Result<Self> {
        self.manifest = resolve_all(scope, assets)?;
        Ok(self)
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn manifest(&self) -> &[Url] {
        &self.manifest
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin
    }

    /// Populate the current bucket with the whole manifest.
    ///
    /// Every asset is fetched before anything is written, so a single failure
    /// leaves the bucket without any of them.
    pub async fn install(&self) -> Result<()> {
        info!("Installing {} ({} assets)", self.cache_name, self.manifest.len());
        self.cache.open(&self.cache_name).await?;

        let fetches = self.manifest.iter().map(|url| async move {
            let response = self.fetcher.fetch(&Request::get(url.clone())).await?;
            if !response.is_success() {
                return Err(WorkerError::BadStatus {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            Ok((url.clone(), response))
        });
        let entries = try_join_all(fetches).await?;

        self.cache.put_all(&self.cache_name, entries).await?;
        info!("Cached application shell into {}", self.cache_name);
        Ok(())
    }

    /// Delete every bucket except the current one, then claim all clients.
    /// Returns the names of deleted buckets.
    pub async fn activate(&self) -> Result<Vec<String>> {
        let stale: Vec<String> = self
            .cache
            .keys()
            .await?
            .into_iter()
            .filter(|name| *name != self.cache_name)
            .collect();

        for name in &stale {
            self.cache.delete(name).await?;
            info!("Deleted stale cache bucket {}", name);
        }

        self.clients.claim().await?;
        Ok(stale)
    }

    /// Answer a GET from the cache, then the network, then the offline
    /// fallbacks. Returns `None` for other methods, which bypass the cache.
    pub async fn handle_fetch(&self, request: &Request) -> Option<Response> {
        if !request.is_get() {
            return None;
        }

        if let Some(cached) = self.lookup(&request.url).await {
            debug!("Cache hit: {}", request.url);
            return Some(cached);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                // Any status the network answered with is stored, error pages included.
                if self.is_same_origin(&request.url) {
                    self.store(&request.url, response.clone()).await;
                }
                Some(response)
            }
            Err(e) => {
                warn!("Network unavailable for {}: {}", request.url, e);
                match self.lookup(&self.entry_document).await {
                    Some(fallback) => Some(fallback),
                    None => Some(Response::offline()),
                }
            }
        }
    }

    async fn lookup(&self, url: &Url) -> Option<Response> {
        match self.cache.match_url(&self.cache_name, url).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache lookup for {} failed: {}", url, e);
                None
            }
        }
    }

    async fn store(&self, url: &Url, response: Response) {
        match self.cache.put(&self.cache_name, url, response).await {
            Ok(()) => debug!("Cached {}", url),
            Err(e) => warn!("Failed to cache {}: {}", url, e),
        }
    }
}

fn resolve_all(scope: &Url, assets: &[&str]) -> Result<Vec<Url>> {
    assets
        .iter()
        .map(|asset| scope.join(asset).map_err(WorkerError::from))
        .collect()
}
