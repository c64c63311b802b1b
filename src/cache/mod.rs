pub mod inflight;
pub mod keys;
pub mod store;

use std::sync::Arc;

use crate::config::Config;

pub use inflight::{InflightRequests, SharedFetch};
pub use keys::CacheKey;
pub use store::{is_fresh, CacheEntry, CacheStore, MokaCacheStore};

pub fn init_cache(config: &Config) -> Arc<dyn CacheStore> {
    Arc::new(MokaCacheStore::new(config.cache_max_capacity, config.cache_max_age))
}
