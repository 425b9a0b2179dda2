//! Fixed-window rate limiting
//!
//! A counter per key is incremented on every request; once it exceeds the threshold
//! within the current window, requests are rejected until the window rolls over.
//! Counters live behind [`RateLimitStore`] so that several service instances can share
//! them (Redis) while tests and single-instance deployments use process memory.

mod memory;
#[cfg(feature = "rate-limit-redis")]
mod redis;

pub use memory::MemoryRateLimitStore;
#[cfg(feature = "rate-limit-redis")]
pub use self::redis::RedisRateLimitStore;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Counter state after an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    /// Requests seen in the current window, including this one
    pub count: u64,
    /// Time until the current window closes
    pub reset_in: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitStoreError {
    #[error("Rate limit store unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limit store timed out")]
    Timeout,
}

/// Shared counter store with an atomic increment
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn increment(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<WindowCount, RateLimitStoreError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_in: Duration,
}

impl RateLimitDecision {
    /// Seconds a rejected client should wait, never zero
    pub fn retry_after_secs(&self) -> u64 {
        self.reset_in.as_secs().max(1)
    }
}

/// Fixed-window limiter over a [`RateLimitStore`]
#[derive(Clone)]
pub struct FixedWindowRateLimiter {
    store: Arc<dyn RateLimitStore>,
    max_requests: u32,
    window: Duration,
}

impl FixedWindowRateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, max_requests: u32, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one request for `key` and decide whether it may proceed.
    ///
    /// A store failure lets the request through and is logged.
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        match self.store.increment(key, self.window).await {
            Ok(WindowCount { count, reset_in }) => {
                let allowed = count <= u64::from(self.max_requests);
                let remaining = u64::from(self.max_requests).saturating_sub(count) as u32;
                RateLimitDecision {
                    allowed,
                    limit: self.max_requests,
                    remaining,
                    reset_in,
                }
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    store = self.store.name(),
                    key = %key,
                    "Rate limit store failed, allowing request"
                );
                RateLimitDecision {
                    allowed: true,
                    limit: self.max_requests,
                    remaining: self.max_requests,
                    reset_in: self.window,
                }
            }
        }
    }
}
