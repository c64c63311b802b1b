//! Response cache store backed by Moka

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use super::keys::CacheKey;

/// How many freshness windows a stale entry is retained before Moka drops it.
pub const RETENTION_FACTOR: u32 = 4;

/// Upper bound on the retention horizon; Moka rejects TTLs beyond 1000 years.
pub const MAX_RETENTION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A cached upstream response and the instant it was populated.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Value,
    pub timestamp: Instant,
}

/// `now - entry.timestamp < max_age`
pub fn is_fresh(entry: &CacheEntry, now: Instant, max_age: Duration) -> bool {
    now.saturating_duration_since(entry.timestamp) < max_age
}

/// Storage seam for proxied responses.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the entry for `key` if one is present, fresh or not.
    async fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// Stores `data` under `key`, replacing any previous entry.
    async fn put(&self, key: CacheKey, data: Value, now: Instant);

    fn is_fresh(&self, entry: &CacheEntry, now: Instant, max_age: Duration) -> bool {
        is_fresh(entry, now, max_age)
    }
}

/// In-process store. Freshness is decided from `CacheEntry::timestamp`; the
/// Moka capacity and retention only bound memory.
#[derive(Clone)]
pub struct MokaCacheStore {
    cache: Cache<CacheKey, CacheEntry>,
}

impl MokaCacheStore {
    pub fn new(capacity: u64, max_age: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(max_age.saturating_mul(RETENTION_FACTOR).min(MAX_RETENTION))
            .build();

        Self { cache }
    }

    /// Approximate number of stored entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl CacheStore for MokaCacheStore {
    async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.cache.get(key).await
    }

    async fn put(&self, key: CacheKey, data: Value, now: Instant) {
        debug!("Caching response for key: {}", key);
        self.cache.insert(key, CacheEntry { data, timestamp: now }).await;
    }
}
