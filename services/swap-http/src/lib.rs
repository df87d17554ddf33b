pub mod api;
pub mod config;
pub mod limiter;
pub mod metrics;
pub mod server;
pub mod state;

pub use api::{create_router, ApiError, ErrorResponse, ReplaceResponse, RequestId};
pub use config::SwapConfig;
pub use limiter::{RateLimited, RateLimiter};
pub use metrics::{MetricsSnapshot, ServiceMetrics};
pub use state::AppState;
