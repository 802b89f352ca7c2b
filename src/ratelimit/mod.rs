use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub mod store_redis;

/// Fixed window anchored at first use: the first call opens the window, all
/// calls inside it increment the counter, and the window restarts from the
/// first call after `reset_at`.
#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub count: i64,
    pub reset_at: DateTime<Utc>,
}

pub fn window_allow(
    entry: Option<&RateLimitEntry>,
    max_requests: i64,
    window_ms: i64,
    now: DateTime<Utc>,
) -> (RateLimitEntry, bool) {
    match entry {
        Some(e) if now < e.reset_at => {
            let next = RateLimitEntry {
                count: e.count + 1,
                reset_at: e.reset_at,
            };
            let allowed = next.count <= max_requests;
            (next, allowed)
        }
        _ => {
            let next = RateLimitEntry {
                count: 1,
                reset_at: now + Duration::milliseconds(window_ms),
            };
            let allowed = max_requests >= 1;
            (next, allowed)
        }
    }
}

/// Keys follow the `"<action>:<identifier>"` convention.
#[async_trait::async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn allow(&self, key: &str, max_requests: i64, window_ms: i64) -> Result<bool>;
}

/// Process-local store. Correct for a single instance only; multi-instance
/// deployments use the Redis-backed store behind the same trait.
#[derive(Default)]
pub struct MemoryRateLimitStore {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, key: &str, max_requests: i64, window_ms: i64, now: DateTime<Utc>) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let (next, allowed) = window_allow(entries.get(key), max_requests, window_ms, now);
        entries.insert(key.to_string(), next);
        allowed
    }

    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| now < entry.reset_at);
        before - entries.len()
    }

    pub async fn sweep_loop(self: Arc<Self>, every: std::time::Duration) {
        loop {
            tokio::time::sleep(every).await;
            let dropped = self.sweep_expired(Utc::now());
            if dropped > 0 {
                tracing::debug!(dropped, "swept expired rate-limit entries");
            }
        }
    }
}

#[async_trait::async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn allow(&self, key: &str, max_requests: i64, window_ms: i64) -> Result<bool> {
        Ok(self.apply(key, max_requests, window_ms, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourth_call_in_window_is_rejected() {
        let store = MemoryRateLimitStore::new();
        let now = Utc::now();

        let results: Vec<bool> = (0..4).map(|_| store.apply("initiate:s1", 3, 1000, now)).collect();
        assert_eq!(results, vec![true, true, true, false]);
    }

    #[test]
    fn window_restarts_after_reset_time() {
        let store = MemoryRateLimitStore::new();
        let now = Utc::now();

        for _ in 0..4 {
            store.apply("initiate:s1", 3, 1000, now);
        }
        let later = now + Duration::milliseconds(1001);
        assert!(store.apply("initiate:s1", 3, 1000, later));
    }

    #[test]
    fn keys_are_independent() {
        let store = MemoryRateLimitStore::new();
        let now = Utc::now();

        for _ in 0..4 {
            store.apply("initiate:s1", 3, 1000, now);
        }
        assert!(store.apply("initiate:s2", 3, 1000, now));
    }

    #[test]
    fn sweep_drops_only_expired_entries() {
        let store = MemoryRateLimitStore::new();
        let now = Utc::now();

        store.apply("a", 3, 1000, now);
        store.apply("b", 3, 60_000, now);

        let swept = store.sweep_expired(now + Duration::milliseconds(1500));
        assert_eq!(swept, 1);

        // "b" kept its window: the counter did not reset.
        for _ in 0..2 {
            store.apply("b", 3, 60_000, now + Duration::milliseconds(1500));
        }
        assert!(!store.apply("b", 3, 60_000, now + Duration::milliseconds(1500)));
    }
}
