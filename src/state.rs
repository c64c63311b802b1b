use crate::api::middleware::{build_rate_limiter, IpRateLimiter};
use crate::config::Config;
use crate::service::ProxyService;
use std::sync::Arc;
use std::time::Instant;

pub struct AppState {
    pub config: Config,
    pub proxy: ProxyService,
    pub rate_limiter: Option<Arc<IpRateLimiter>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, proxy: ProxyService) -> Self {
        let rate_limiter = build_rate_limiter(&config.rate_limit).map(Arc::new);

        Self {
            config,
            proxy,
            rate_limiter,
            started_at: Instant::now(),
        }
    }
}
