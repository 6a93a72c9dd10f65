use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::ResilienceError;

/// Token-bucket limits applied per client key.
#[derive(Debug, Clone)]
pub struct RateConfig {
    /// Bucket capacity: burst allowance and requests-per-window.
    pub max_requests: u32,
    /// Refill window: a full bucket's worth of tokens per window.
    pub window: Duration,
    /// Buckets idle longer than this are evicted during pruning.
    pub idle_eviction: Duration,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
            idle_eviction: Duration::from_secs(600),
        }
    }
}

#[derive(Debug)]
struct RateBucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

/// Per-client-key token buckets. A bucket is created full on the first
/// request from a key; updates for one key happen under the map's write
/// guard so concurrent requests cannot double-spend a token.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<RwLock<HashMap<String, RateBucket>>>,
    config: RateConfig,
}

impl RateLimiter {
    pub fn new(config: RateConfig) -> Self {
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Take one token for `key`, refilling by elapsed time first.
    pub async fn try_acquire(&self, key: &str) -> Result<(), ResilienceError> {
        let refill_per_sec = self.config.max_requests as f64 / self.config.window.as_secs_f64();
        let mut buckets = self.buckets.write().await;
        let now = Instant::now();
        let bucket = buckets.entry(key.to_string()).or_insert(RateBucket {
            tokens: self.config.max_requests as f64,
            last_refill: now,
            last_seen: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens =
            (bucket.tokens + elapsed * refill_per_sec).min(self.config.max_requests as f64);
        bucket.last_refill = now;
        bucket.last_seen = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            debug!(key, remaining = bucket.tokens, "rate token taken");
            Ok(())
        } else {
            let retry_after_ms = ((1.0 - bucket.tokens) / refill_per_sec * 1000.0) as u64;
            Err(ResilienceError::RateLimited {
                key: key.to_string(),
                retry_after_ms,
            })
        }
    }

    /// Drop buckets that have been idle past the eviction horizon.
    pub async fn prune_idle(&self) -> usize {
        let mut buckets = self.buckets.write().await;
        let before = buckets.len();
        let horizon = self.config.idle_eviction;
        buckets.retain(|_, b| b.last_seen.elapsed() < horizon);
        before - buckets.len()
    }
}
