use crate::ratelimit::RateLimitStore;
use anyhow::Result;
use redis::AsyncCommands;

/// Shared-store variant of the same `allow` contract, for multi-instance
/// deployments. INCR opens the window on first use; EXPIRE bounds its life.
pub struct RedisRateLimitStore {
    client: redis::Client,
}

impl RedisRateLimitStore {
    pub fn new(redis_url: &str) -> Result<Self> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
        })
    }
}

#[async_trait::async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn allow(&self, key: &str, max_requests: i64, window_ms: i64) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let namespaced = format!("ratelimit:{key}");
        let count: i64 = conn.incr(&namespaced, 1).await?;
        if count == 1 {
            let window_secs = ((window_ms + 999) / 1000).max(1);
            let _: bool = conn.expire(&namespaced, window_secs).await?;
        }

        Ok(count <= max_requests)
    }
}
