pub mod error;
pub mod middleware;
pub mod route;

pub use error::ApiError;
pub use route::create_router;
