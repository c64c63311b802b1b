use crate::config::Config;
use crate::models::BlockQuery;
use crate::upstream::{Upstream, UpstreamError};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

pub const MAX_BLOCK_NUMBER_PATH: &str = "/mapper/get_max_block_number";
pub const POINTS_BY_RANGE_PATH: &str = "/mapper/get_points_by_block_range_no_embedding";
pub const TIMESTAMP_PATH: &str = "/blockchain/get_timestamp_from_block_number";

/// SentiChain HTTP client.
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    network: String,
}

impl HttpUpstream {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        info!(
            "Initializing upstream client with base URL: {}, timeout: {:?}",
            config.api_base_url, config.upstream_timeout
        );

        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            network: config.network.clone(),
        })
    }

    /// Path and query parameters for a logical operation.
    fn request_for(&self, query: &BlockQuery) -> (&'static str, Vec<(&'static str, String)>) {
        match query {
            BlockQuery::MaxBlockNumber => (MAX_BLOCK_NUMBER_PATH, Vec::new()),
            BlockQuery::PointsByRange(range) => (
                POINTS_BY_RANGE_PATH,
                vec![
                    ("start_block", range.start_block.to_string()),
                    ("end_block", range.end_block.to_string()),
                    ("api_key", self.api_key.clone()),
                ],
            ),
            BlockQuery::TimestampByBlock(block) => (
                TIMESTAMP_PATH,
                vec![
                    ("network", self.network.clone()),
                    ("block_number", block.to_string()),
                ],
            ),
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, query: &BlockQuery) -> Result<Value, UpstreamError> {
        let (path, params) = self.request_for(query);
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching {} from {}", query.operation(), url);

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| UpstreamError::Request {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| UpstreamError::Request {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::models::BlockRange;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn spawn_upstream() -> String {
        let app = Router::new()
            .route(
                MAX_BLOCK_NUMBER_PATH,
                get(|| async { Json(json!({"max_block_number": 123456})) }),
            )
            .route(
                POINTS_BY_RANGE_PATH,
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    if params.get("api_key").map(String::as_str) != Some("secret") {
                        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "bad key"})));
                    }
                    let start = params.get("start_block").cloned().unwrap_or_default();
                    let end = params.get("end_block").cloned().unwrap_or_default();
                    (StatusCode::OK, Json(json!({"points": [[start, end, 0.5]]})))
                }),
            )
            .route(
                TIMESTAMP_PATH,
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    Json(json!({
                        "network": params.get("network"),
                        "timestamp": format!("ts-{}", params.get("block_number").cloned().unwrap_or_default()),
                    }))
                }),
            );

        serve(app).await
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn client_for(base_url: String, api_key: &str) -> HttpUpstream {
        let mut config = Config::for_environment(Environment::Test);
        config.api_base_url = base_url;
        config.api_key = api_key.to_string();
        HttpUpstream::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_max_block_number() {
        let client = client_for(spawn_upstream().await, "secret");
        let body = client.fetch(&BlockQuery::MaxBlockNumber).await.unwrap();
        assert_eq!(body, json!({"max_block_number": 123456}));
    }

    #[tokio::test]
    async fn test_fetch_range_sends_api_key() {
        let client = client_for(spawn_upstream().await, "secret");
        let query = BlockQuery::PointsByRange(BlockRange { start_block: 10, end_block: 12 });
        let body = client.fetch(&query).await.unwrap();
        assert_eq!(body, json!({"points": [["10", "12", 0.5]]}));
    }

    #[tokio::test]
    async fn test_fetch_timestamp_sends_network() {
        let client = client_for(spawn_upstream().await, "secret");
        let body = client.fetch(&BlockQuery::TimestampByBlock(77)).await.unwrap();
        assert_eq!(body["network"], "mainnet");
        assert_eq!(body["timestamp"], "ts-77");
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let client = client_for(spawn_upstream().await, "wrong");
        let query = BlockQuery::PointsByRange(BlockRange { start_block: 1, end_block: 2 });
        let err = client.fetch(&query).await.unwrap_err();
        assert_eq!(
            err,
            UpstreamError::Status { path: POINTS_BY_RANGE_PATH.to_string(), status: 401 }
        );
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_upstream_error() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(format!("http://{}", addr), "secret");
        let err = client.fetch(&BlockQuery::MaxBlockNumber).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Request { .. }));
    }

    #[tokio::test]
    async fn test_invalid_json_is_upstream_error() {
        let base = serve(Router::new().route(MAX_BLOCK_NUMBER_PATH, get(|| async { "not json" }))).await;
        let client = client_for(base, "secret");
        let err = client.fetch(&BlockQuery::MaxBlockNumber).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Decode { .. }));
    }
}
