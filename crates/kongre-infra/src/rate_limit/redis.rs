use super::{RateLimitStore, RateLimitStoreError, WindowCount};
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::Client;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::timeout;

const COMMAND_TIMEOUT: Duration = Duration::from_millis(250);

/// Redis-backed counter store shared by every service instance
///
/// Windows are aligned to multiples of the window length since the Unix epoch, so all
/// instances agree on boundaries. Each window has its own key,
/// `{prefix}:rl:{key}:{window_index}`, which is incremented and given a TTL in a single
/// MULTI/EXEC transaction.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    connection: ConnectionManager,
    prefix: String,
}

impl RedisRateLimitStore {
    pub async fn connect(redis_url: &str, prefix: &str) -> Result<Self, RateLimitStoreError> {
        let config = ConnectionManagerConfig::new().set_number_of_retries(1);

        let client =
            Client::open(redis_url).map_err(|e| RateLimitStoreError::Unavailable(e.to_string()))?;
        let connection = client
            .get_connection_manager_with_config(config)
            .await
            .map_err(|e| RateLimitStoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            connection,
            prefix: prefix.to_string(),
        })
    }
}

/// Key and time remaining for the window containing `now_secs`
fn window_key(prefix: &str, key: &str, window_secs: u64, now_secs: u64) -> (String, u64) {
    let window_secs = window_secs.max(1);
    let index = now_secs / window_secs;
    let reset_in = (index + 1) * window_secs - now_secs;
    (format!("{}:rl:{}:{}", prefix, key, index), reset_in)
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn increment(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<WindowCount, RateLimitStoreError> {
        let now_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| RateLimitStoreError::Unavailable(e.to_string()))?
            .as_secs();
        let window_secs = window.as_secs().max(1);
        let (redis_key, reset_in) = window_key(&self.prefix, key, window_secs, now_secs);

        let mut conn = self.connection.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .incr(&redis_key, 1_i64)
            .expire(&redis_key, (window_secs + 1) as i64)
            .ignore();

        let (count,): (i64,) = timeout(COMMAND_TIMEOUT, pipe.query_async(&mut conn))
            .await
            .map_err(|_| RateLimitStoreError::Timeout)?
            .map_err(|e| RateLimitStoreError::Unavailable(e.to_string()))?;

        Ok(WindowCount {
            count: count.max(0) as u64,
            reset_in: Duration::from_secs(reset_in),
        })
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
