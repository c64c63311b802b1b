use crate::{
    api::{error::ApiError, middleware::rate_limit_middleware},
    config::API_VERSION,
    models::{BlockQuery, HealthResponse, MemoryUsage, RangeParams, StatusResponse},
    state::AppState,
    validation::{validate_block_number, validate_block_range, ValidationError},
};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::System;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
};
use tracing::{info, warn};

pub const X_API_VERSION: HeaderName = HeaderName::from_static("x-api-version");

// Create router with all routes
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let mut api = Router::new()
        .route("/blocks/max", get(max_block_number))
        .route("/blocks/range", get(points_by_block_range))
        .route("/blocks/timestamp/{block_number}", get(timestamp_by_block))
        .route("/health", get(health))
        .route("/status", get(status))
        .fallback(api_not_found)
        .with_state(app_state.clone());

    if let Some(limiter) = app_state.rate_limiter.clone() {
        api = api.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    let api = api.layer(SetResponseHeaderLayer::overriding(
        X_API_VERSION,
        HeaderValue::from_static(API_VERSION),
    ));

    let router = Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(cors_layer(&app_state.config.cors_origins));

    with_security_headers(router)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

fn with_security_headers(router: Router) -> Router {
    let headers = [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        (header::REFERRER_POLICY, "no-referrer"),
        (header::X_DNS_PREFETCH_CONTROL, "off"),
    ];

    headers.into_iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
            name,
            HeaderValue::from_static(value),
        ))
    })
}

// GET /api/blocks/max handler
async fn max_block_number(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    fetch(&state, BlockQuery::MaxBlockNumber).await
}

// GET /api/blocks/range handler
async fn points_by_block_range(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        warn!("Rejected range query: {}", rejection.body_text());
        ValidationError::InvalidArgument(rejection.body_text())
    })?;
    let range = validate_block_range(params.start_block.as_deref(), params.end_block.as_deref())?;
    info!(
        "Processing range request for blocks {}-{}",
        range.start_block, range.end_block
    );

    fetch(&state, BlockQuery::PointsByRange(range)).await
}

// GET /api/blocks/timestamp/{block_number} handler
async fn timestamp_by_block(
    State(state): State<Arc<AppState>>,
    block_number: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(block_number) = block_number.map_err(|rejection| {
        warn!("Rejected block number path: {}", rejection.body_text());
        ValidationError::InvalidArgument("Invalid block number".to_string())
    })?;
    let block = validate_block_number(&block_number)?;
    fetch(&state, BlockQuery::TimestampByBlock(block)).await
}

async fn fetch(state: &AppState, query: BlockQuery) -> Result<Json<Value>, ApiError> {
    state
        .proxy
        .get(query)
        .await
        .map(Json)
        .map_err(|e| ApiError::upstream(&query, &e, state.config.environment))
}

// GET /api/health handler
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: API_VERSION,
        environment: state.config.environment.to_string(),
        timestamp: iso_now(),
    })
}

// GET /api/status handler
async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "operational",
        uptime: format_uptime(state.started_at.elapsed()),
        memory: memory_usage(),
        environment: state.config.environment.to_string(),
        timestamp: iso_now(),
    })
}

async fn api_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound { path: uri.to_string() }
}

// Paths the nested router never sees, such as `/api/`
async fn not_found(OriginalUri(uri): OriginalUri) -> Response {
    let path = uri.path();
    if path == "/api" || path.starts_with("/api/") {
        let mut response = ApiError::NotFound { path: uri.to_string() }.into_response();
        response
            .headers_mut()
            .insert(X_API_VERSION, HeaderValue::from_static(API_VERSION));
        return response;
    }

    StatusCode::NOT_FOUND.into_response()
}

fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn memory_usage() -> MemoryUsage {
    let pid = match sysinfo::get_current_pid() {
        Ok(pid) => pid,
        Err(_) => return MemoryUsage::default(),
    };

    let mut sys = System::new();
    sys.refresh_process(pid);
    sys.process(pid)
        .map(|process| MemoryUsage {
            rss: process.memory(),
            virtual_memory: process.virtual_memory(),
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0h 0m 0s");
        assert_eq!(format_uptime(Duration::from_secs(3725)), "1h 2m 5s");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "25h 1m 1s");
    }
}
