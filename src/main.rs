// Initialize configuration
// Set up logging
// Build the upstream client, cache and processing pipeline
// Create shared state
// Start the rate limiter purge task
// Start HTTP server with graceful shutdown

use sentimove_data_service::{
    api::{self, middleware::purge_rate_limiter},
    cache,
    config::Config,
    service::ProxyService,
    state::AppState,
    upstream::{HttpUpstream, Pipeline},
};

use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sentimove-data-service");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: environment={}, upstream={}, cache max age={:?}",
        config.environment, config.api_base_url, config.cache_max_age
    );

    // Initialize cache
    let cache = cache::init_cache(&config);
    info!(
        "Cache initialized with max age: {:?} and capacity: {}",
        config.cache_max_age, config.cache_max_capacity
    );

    let upstream = Arc::new(HttpUpstream::new(&config)?);
    let pipeline = Pipeline::standard(config.processed_by.clone());
    let proxy = ProxyService::new(cache, upstream, pipeline, config.cache_max_age);

    // Create shared state
    let app_state = Arc::new(AppState::new(config.clone(), proxy));

    let shutdown = CancellationToken::new();

    if let Some(limiter) = app_state.rate_limiter.clone() {
        tokio::spawn(purge_rate_limiter(
            limiter,
            config.rate_limit.window,
            shutdown.clone(),
        ));
    }

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
        }
        signal_token.cancel();
    });

    // Start HTTP server
    let app = api::create_router(app_state);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running in {} mode on {}", config.environment, addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await?;

    info!("Server stopped");
    Ok(())
}
