use crate::api::error::ApiError;
use crate::config::RateLimitConfig;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// Per-IP limiter allowing `max_requests` per `window`, replenished evenly
/// across the window. `None` when `max_requests` is zero (limiting disabled).
pub fn build_rate_limiter(config: &RateLimitConfig) -> Option<IpRateLimiter> {
    let burst = NonZeroU32::new(config.max_requests)?;
    let period = (config.window / config.max_requests).max(Duration::from_nanos(1));
    let quota = Quota::with_period(period)?.allow_burst(burst);

    info!(
        "Rate limiting {} requests per {:?} per client IP",
        config.max_requests, config.window
    );
    Some(RateLimiter::keyed(quota))
}

fn client_ip(request: &Request<Body>) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Rejects a request with 429 once its client IP has used up its budget.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<IpRateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&request);

    if limiter.check_key(&ip).is_err() {
        warn!(client = %ip, "rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }

    next.run(request).await
}

/// Drops limiter state for clients that have fully replenished, until `shutdown`.
pub async fn purge_rate_limiter(
    limiter: Arc<IpRateLimiter>,
    every: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                limiter.retain_recent();
                limiter.shrink_to_fit();
                debug!("Rate limiter tracking {} clients", limiter.len());
            }
            _ = shutdown.cancelled() => {
                info!("Shutting down rate limiter purge task");
                break;
            }
        }
    }
}
