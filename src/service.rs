//! Cache-backed proxy in front of the upstream API.
//!
//! Every lookup goes through the same steps: derive the cache key, serve a
//! fresh entry if there is one, otherwise join (or start) the single in-flight
//! fetch for that key. A started fetch runs on its own task so that it
//! completes and populates the cache even if every waiting client goes away.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::cache::{inflight::FetchResult, CacheKey, CacheStore, InflightRequests};
use crate::models::BlockQuery;
use crate::upstream::{Pipeline, Upstream, UpstreamError};

/// Sentinel returned when upstream knows no timestamp for a block.
pub const TIMESTAMP_UNAVAILABLE: &str = "N/A";

#[derive(Clone)]
pub struct ProxyService {
    cache: Arc<dyn CacheStore>,
    upstream: Arc<dyn Upstream>,
    pipeline: Arc<Pipeline>,
    inflight: Arc<InflightRequests>,
    max_age: Duration,
}

impl ProxyService {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        upstream: Arc<dyn Upstream>,
        pipeline: Pipeline,
        max_age: Duration,
    ) -> Self {
        Self {
            cache,
            upstream,
            pipeline: Arc::new(pipeline),
            inflight: Arc::new(InflightRequests::new()),
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Resolve `query` from the cache or, on a miss or stale entry, from upstream.
    pub async fn get(&self, query: BlockQuery) -> Result<Value, UpstreamError> {
        let key = CacheKey::from(&query);

        if let Some(data) = self.fresh(&key).await {
            debug!("Cache hit for key: {}", key);
            return Ok(data);
        }
        debug!("Cache miss for key: {}", key);

        let (fetch, started) = self
            .inflight
            .join_or_start(&key, || self.start_fetch(query, key.clone()));

        if started {
            tokio::spawn(fetch.clone());
        } else {
            debug!("Joining in-flight fetch for key: {}", key);
        }

        fetch.await
    }

    async fn fresh(&self, key: &CacheKey) -> Option<Value> {
        let entry = self.cache.get(key).await?;
        if self.cache.is_fresh(&entry, Instant::now(), self.max_age) {
            Some(entry.data)
        } else {
            None
        }
    }

    fn start_fetch(&self, query: BlockQuery, key: CacheKey) -> BoxFuture<'static, FetchResult> {
        let service = self.clone();

        async move {
            // Another fetch may have refreshed the entry since our lookup
            let result = match service.fresh(&key).await {
                Some(data) => Ok(data),
                None => service.fetch_and_store(&query, &key).await,
            };
            service.inflight.remove(&key);
            result
        }
        .boxed()
    }

    async fn fetch_and_store(&self, query: &BlockQuery, key: &CacheKey) -> FetchResult {
        let body = match self.upstream.fetch(query).await {
            Ok(body) => body,
            Err(e) => {
                error!("Error fetching {}: {}", query.operation(), e);
                return Err(e);
            }
        };

        let (data, cacheable) = self.finalize(query, body);
        if cacheable {
            self.cache.put(key.clone(), data.clone(), Instant::now()).await;
            info!("Added upstream response to cache with key: {}", key);
        }

        Ok(data)
    }

    /// Shape the upstream body for the client and decide whether to keep it.
    fn finalize(&self, query: &BlockQuery, body: Value) -> (Value, bool) {
        match query {
            BlockQuery::MaxBlockNumber => (body, true),
            BlockQuery::PointsByRange(_) => (self.pipeline.process(body), true),
            BlockQuery::TimestampByBlock(block) => {
                let known = body
                    .get("timestamp")
                    .map(|timestamp| !timestamp.is_null())
                    .unwrap_or(false);
                if known {
                    (body, true)
                } else {
                    debug!("No timestamp available upstream for block {}", block);
                    (json!({ "timestamp": TIMESTAMP_UNAVAILABLE }), false)
                }
            }
        }
    }
}
