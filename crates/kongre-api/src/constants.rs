//! HTTP constants shared by routes, handlers and tests

/// API base path prefix
pub const API_BASE: &str = "/api";

pub const OPENAPI_JSON_PATH: &str = "/api/openapi.json";

pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Interval between sweeps of expired in-memory rate-limit windows
pub const RATE_LIMIT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Headroom over the paper size limit for request framing
pub const BODY_LIMIT_SLACK_BYTES: usize = 64 * 1024;
