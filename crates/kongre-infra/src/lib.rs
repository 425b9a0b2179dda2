//! Kongre Infrastructure Library
//!
//! Shared infrastructure components used by the Kongre service:
//! - Middleware (request ID, security headers)
//! - Telemetry initialization
//! - Fixed-window rate limiting with Redis and in-memory stores

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, RequestId,
};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{
    FixedWindowRateLimiter, MemoryRateLimitStore, RateLimitDecision, RateLimitStore,
    RateLimitStoreError, WindowCount,
};

#[cfg(feature = "rate-limit-redis")]
pub use rate_limit::RedisRateLimitStore;
