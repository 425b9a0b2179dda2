use super::{RateLimitStore, RateLimitStoreError, WindowCount};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Clone)]
struct RateLimitBucket {
    count: u64,
    reset_at: Instant,
}

impl RateLimitBucket {
    fn new(window: Duration) -> Self {
        Self {
            count: 0,
            reset_at: Instant::now() + window,
        }
    }

    fn increment(&mut self, window: Duration) -> WindowCount {
        let now = Instant::now();

        // Reset if window expired
        if now >= self.reset_at {
            self.count = 0;
            self.reset_at = now + window;
        }

        self.count += 1;
        WindowCount {
            count: self.count,
            reset_in: self.reset_at.saturating_duration_since(now),
        }
    }
}

/// In-process counter store
///
/// Counters are per process, so limits are only exact for a single instance. Uses
/// multiple shards (separate HashMaps) to reduce contention on a single mutex.
#[derive(Clone)]
pub struct MemoryRateLimitStore {
    shards: Vec<Arc<Mutex<HashMap<String, RateLimitBucket>>>>,
    max_buckets: usize, // Per shard, before expired buckets are evicted
}

impl Default for MemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRateLimitStore {
    /// Create a store with the default shard count (16 shards)
    pub fn new() -> Self {
        Self::with_shards(16)
    }

    pub fn with_shards(shard_count: usize) -> Self {
        let shards = (0..shard_count.max(1))
            .map(|_| Arc::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            shards,
            max_buckets: 10_000,
        }
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    /// Remove buckets whose window has closed
    pub async fn cleanup_expired_buckets(&self) {
        let now = Instant::now();
        let mut total_cleaned = 0;

        for shard in &self.shards {
            let mut buckets = shard.lock().await;
            let before_count = buckets.len();
            buckets.retain(|_key, bucket| bucket.reset_at > now);
            total_cleaned += before_count - buckets.len();
        }

        if total_cleaned > 0 {
            tracing::debug!(
                buckets_cleaned = total_cleaned,
                "Cleaned up expired rate limit buckets across all shards"
            );
        }
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn increment(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<WindowCount, RateLimitStoreError> {
        let shard = &self.shards[self.shard_index(key)];
        let mut buckets = shard.lock().await;

        if buckets.len() >= self.max_buckets && !buckets.contains_key(key) {
            let now = Instant::now();
            buckets.retain(|_key, bucket| bucket.reset_at > now);

            // Still full: evict the bucket closest to expiry
            if buckets.len() >= self.max_buckets {
                let oldest_key = buckets
                    .iter()
                    .min_by_key(|(_, bucket)| bucket.reset_at)
                    .map(|(k, _)| k.clone());
                if let Some(key_to_remove) = oldest_key {
                    buckets.remove(&key_to_remove);
                }
            }
        }

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| RateLimitBucket::new(window));
        Ok(bucket.increment(window))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
