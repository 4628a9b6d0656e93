//! Process-wide HTTP response cache.
//!
//! Backed by a `moka` future cache, so any number of executors may share one
//! [`ResponseCache`] concurrently (last writer wins per key). Entries are
//! fresh for `ttl`; after that they linger for `stale_window` and are only
//! served when the network path has failed.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::time::Instant;

use crate::models::{FetchRequest, FetchResponse, HttpMethod, compute_hash};

/// Identity of a cacheable request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub method: HttpMethod,
    pub url: String,
    /// SHA-256 of the request body, if any.
    pub body_digest: Option<String>,
}

impl CacheKey {
    pub fn from_request(request: &FetchRequest) -> Self {
        Self {
            method: request.method,
            url: request.url.clone(),
            body_digest: request.body.as_deref().map(compute_hash),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an entry is served without touching the network.
    pub ttl: Duration,
    /// How long past `ttl` an entry is kept for stale-if-error.
    pub stale_window: Duration,
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            stale_window: Duration::from_secs(24 * 3600),
            max_capacity: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_stale_window(mut self, window: Duration) -> Self {
        self.stale_window = window;
        self
    }

    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }
}

#[derive(Debug, Clone)]
struct CachedResponse {
    url: Arc<str>,
    status: u16,
    body: Arc<str>,
    stored_at: Instant,
}

impl CachedResponse {
    fn to_response(&self, stale: bool) -> FetchResponse {
        FetchResponse {
            url: self.url.to_string(),
            status: self.status,
            body: self.body.to_string(),
            from_cache: true,
            stale,
        }
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Fresh(FetchResponse),
    /// Past its TTL; usable only as a fallback.
    Stale(FetchResponse),
    Miss,
}

#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<CacheKey, CachedResponse>,
    config: CacheConfig,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl + config.stale_window)
            .build();
        Self { inner, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub async fn lookup(&self, key: &CacheKey) -> CacheLookup {
        let Some(entry) = self.inner.get(key).await else {
            return CacheLookup::Miss;
        };
        let age = entry.stored_at.elapsed();
        if age < self.config.ttl {
            CacheLookup::Fresh(entry.to_response(false))
        } else if age < self.config.ttl + self.config.stale_window {
            CacheLookup::Stale(entry.to_response(true))
        } else {
            CacheLookup::Miss
        }
    }

    /// Store a response regardless of its status code.
    pub async fn store(&self, key: CacheKey, response: &FetchResponse) {
        let entry = CachedResponse {
            url: Arc::from(response.url.as_str()),
            status: response.status,
            body: Arc::from(response.body.as_str()),
            stored_at: Instant::now(),
        };
        self.inner.insert(key, entry).await;
    }

    pub async fn invalidate(&self, key: &CacheKey) {
        self.inner.invalidate(key).await;
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
