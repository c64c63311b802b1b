// Normalized request types and JSON response bodies

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Widest block range a single request may ask for.
pub const MAX_BLOCK_RANGE: i64 = 20;

/// A validated `start_block..=end_block` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRange {
    pub start_block: i64,
    pub end_block: i64,
}

/// One logical upstream operation with its normalized arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockQuery {
    MaxBlockNumber,
    PointsByRange(BlockRange),
    TimestampByBlock(u64),
}

impl BlockQuery {
    /// Human readable operation name, used in logs and error bodies.
    pub fn operation(&self) -> &'static str {
        match self {
            BlockQuery::MaxBlockNumber => "the maximum block number",
            BlockQuery::PointsByRange(_) => "points by block range",
            BlockQuery::TimestampByBlock(_) => "the timestamp",
        }
    }
}

/// Query string of `GET /api/blocks/range`. Kept as raw strings so that
/// missing and non-numeric values reach the validator instead of being
/// rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub start_block: Option<String>,
    pub end_block: Option<String>,
}

/// Range query result after the processing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedPoints {
    pub points: Vec<Value>,
    pub processed: bool,
    pub processed_at: String,
    pub processed_by: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub timestamp: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub rss: u64,
    pub virtual_memory: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub uptime: String,
    pub memory: MemoryUsage,
    pub environment: String,
    pub timestamp: String,
}
