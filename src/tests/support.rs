//! Shared fixtures: a scripted upstream that counts its calls, and builders
//! for the proxy service and router around it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    cache::MokaCacheStore,
    config::{Config, Environment},
    models::BlockQuery,
    service::ProxyService,
    state::AppState,
    upstream::{Pipeline, Upstream, UpstreamError},
};

type Responder = Box<dyn Fn(&BlockQuery) -> Result<Value, UpstreamError> + Send + Sync>;

pub struct MockUpstream {
    calls: AtomicUsize,
    seen: Mutex<Vec<BlockQuery>>,
    delay: Duration,
    responder: Responder,
}

impl MockUpstream {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&BlockQuery) -> Result<Value, UpstreamError> + Send + Sync + 'static,
    {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            responder: Box::new(responder),
        }
    }

    /// Answers every operation the way SentiChain does on a good day.
    pub fn healthy() -> Self {
        Self::new(|query| {
            Ok(match query {
                BlockQuery::MaxBlockNumber => json!({ "max_block_number": 424242 }),
                BlockQuery::PointsByRange(range) => json!({
                    "points": (range.start_block..=range.end_block)
                        .map(|block| json!([block, 0.25, -0.5, "cluster-a"]))
                        .collect::<Vec<_>>()
                }),
                BlockQuery::TimestampByBlock(block) => {
                    json!({ "timestamp": format!("2025-01-01T00:00:{:02}", block % 60) })
                }
            })
        })
    }

    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_| {
            Err(UpstreamError::Request {
                path: "/mapper/get_max_block_number".to_string(),
                message: message.clone(),
            })
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<BlockQuery> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn fetch(&self, query: &BlockQuery) -> Result<Value, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(*query);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.responder)(query)
    }
}

pub const TEST_MAX_AGE: Duration = Duration::from_secs(3600);

pub fn proxy_with(upstream: Arc<MockUpstream>) -> (ProxyService, Arc<MokaCacheStore>) {
    let store = Arc::new(MokaCacheStore::new(1_000, TEST_MAX_AGE));
    let proxy = ProxyService::new(
        store.clone(),
        upstream,
        Pipeline::standard("SentiMove Server v1.0"),
        TEST_MAX_AGE,
    );
    (proxy, store)
}

pub fn state_with(upstream: Arc<MockUpstream>, environment: Environment) -> Arc<AppState> {
    let mut config = Config::for_environment(environment);
    config.cache_max_age = TEST_MAX_AGE;
    state_with_config(upstream, config)
}

pub fn state_with_config(upstream: Arc<MockUpstream>, config: Config) -> Arc<AppState> {
    state_and_store(upstream, config).0
}

/// Router state plus a handle on the store behind it.
pub fn state_and_store(
    upstream: Arc<MockUpstream>,
    config: Config,
) -> (Arc<AppState>, Arc<MokaCacheStore>) {
    let (proxy, store) = proxy_with(upstream);
    (Arc::new(AppState::new(config, proxy)), store)
}
