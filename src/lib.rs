pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod service;
pub mod state;
pub mod upstream;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use api::error::ApiError;
pub use api::route::create_router;
pub use config::{Config, Environment};
pub use service::ProxyService;
pub use state::AppState;
pub use validation::{validate_block_number, validate_block_range};
