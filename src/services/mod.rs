//! Capabilities provided by the hosting runtime
//!
//! The worker never reaches for globals: cache storage, the network,
//! notification display and client enumeration are injected through these
//! traits so each can be swapped for an in-memory fake.

pub mod cache_store;
pub mod clients;
pub mod fetcher;
pub mod notifications;

// Re-export main types
pub use cache_store::{cache_key, CacheStore, DiskCacheStore, MemoryCacheStore};
pub use clients::{ClientEvent, ClientHub, ClientId, ClientInfo, ClientRegistry, ClientType};
pub use fetcher::{Fetcher, HttpFetcher};
pub use notifications::{
    NotificationAction, NotificationCenter, NotificationOptions, NotificationRecord, NotificationSink,
};
