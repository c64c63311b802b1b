pub mod client;
pub mod processor;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::BlockQuery;

// Re-exports for convenience
pub use client::HttpUpstream;
pub use processor::{Pipeline, Stage};

/// Any failure talking to the SentiChain API. Cloneable so that a single
/// failed fetch can be handed to every request waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Request to {path} failed: {message}")]
    Request { path: String, message: String },

    #[error("Request to {path} failed with status code {status}")]
    Status { path: String, status: u16 },

    #[error("Invalid JSON from {path}: {message}")]
    Decode { path: String, message: String },
}

/// The third-party API behind the proxy.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, query: &BlockQuery) -> Result<Value, UpstreamError>;
}
