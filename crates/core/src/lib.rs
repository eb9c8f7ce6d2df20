// Core types shared by the ADT session client and the MCP tool server

pub mod metrics;
pub mod session;
pub mod types;

pub use metrics::{MetricsSnapshot, RateLimitPolicy, RequestMetrics};
pub use session::AdtSession;
pub use types::*;
