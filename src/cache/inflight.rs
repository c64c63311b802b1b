//! Coalescing of concurrent upstream fetches for the same key

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;

use super::keys::CacheKey;
use crate::upstream::UpstreamError;

pub type FetchResult = Result<Value, UpstreamError>;
pub type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Map of keys whose upstream fetch is currently running.
#[derive(Default)]
pub struct InflightRequests {
    pending: Mutex<HashMap<CacheKey, SharedFetch>>,
}

impl InflightRequests {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, SharedFetch>> {
        // The map holds no invariants a panicking holder could break
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the fetch already running for `key`, or registers the one
    /// produced by `start`. The flag is `true` when a new fetch was registered.
    pub fn join_or_start<F>(&self, key: &CacheKey, start: F) -> (SharedFetch, bool)
    where
        F: FnOnce() -> BoxFuture<'static, FetchResult>,
    {
        let mut pending = self.lock();
        if let Some(existing) = pending.get(key) {
            return (existing.clone(), false);
        }

        let fetch = start().shared();
        pending.insert(key.clone(), fetch.clone());
        (fetch, true)
    }

    pub fn remove(&self, key: &CacheKey) {
        self.lock().remove(key);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
