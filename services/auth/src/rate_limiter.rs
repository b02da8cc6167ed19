//! Rate limiter for sign-in attempts

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,        // 5 minutes
            ban_duration_seconds: 3600, // 1 hour
        }
    }
}

#[derive(Debug)]
struct RateLimiterEntry {
    attempts: u32,
    window_start: Instant,
    ban_expires: Option<Instant>,
}

impl RateLimiterEntry {
    /// Window over and no ban in force: the entry carries no state worth keeping
    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.window_start) >= window
            && self.ban_expires.is_none_or(|ban_expires| now >= ban_expires)
    }
}

/// Per-key attempt counter with a temporary ban once the limit is hit
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, RateLimiterEntry>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record an attempt for `key` and report whether it may proceed
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);

        entries.retain(|_, entry| !entry.is_stale(now, window));

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            attempts: 0,
            window_start: now,
            ban_expires: None,
        });

        if let Some(ban_expires) = entry.ban_expires {
            if now < ban_expires {
                return false;
            }
            entry.attempts = 0;
            entry.ban_expires = None;
            entry.window_start = now;
        }

        if now.duration_since(entry.window_start) >= window {
            entry.attempts = 0;
            entry.window_start = now;
        }

        if entry.attempts >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            warn!(
                "Banned key {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
            return false;
        }

        entry.attempts += 1;
        true
    }

    /// Forget the attempts recorded for `key`, e.g. after a successful sign-in
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_attempts: u32) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_attempts,
            window_seconds: 300,
            ban_duration_seconds: 3600,
        })
    }

    #[tokio::test]
    async fn test_allows_up_to_max_attempts() {
        let limiter = limiter(3);

        for _ in 0..3 {
            assert!(limiter.is_allowed("signin:rahim@example.com").await);
        }
        assert!(!limiter.is_allowed("signin:rahim@example.com").await);
        assert!(!limiter.is_allowed("signin:rahim@example.com").await);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = limiter(1);

        assert!(limiter.is_allowed("a").await);
        assert!(!limiter.is_allowed("a").await);
        assert!(limiter.is_allowed("b").await);
    }

    #[tokio::test]
    async fn test_reset_clears_attempts() {
        let limiter = limiter(1);

        assert!(limiter.is_allowed("a").await);
        limiter.reset("a").await;
        assert!(limiter.is_allowed("a").await);
    }

    #[tokio::test]
    async fn test_zero_window_resets_every_time() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 1,
            window_seconds: 0,
            ban_duration_seconds: 3600,
        });

        assert!(limiter.is_allowed("a").await);
        assert!(limiter.is_allowed("a").await);
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 5,
            window_seconds: 0,
            ban_duration_seconds: 3600,
        });

        assert!(limiter.is_allowed("signin:made-up-1@example.com").await);
        assert!(limiter.is_allowed("signin:made-up-2@example.com").await);
        assert!(limiter.is_allowed("signin:made-up-3@example.com").await);

        assert_eq!(limiter.tracked_keys().await, 1);
    }

    #[tokio::test]
    async fn test_banned_entries_are_kept() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 1,
            window_seconds: 300,
            ban_duration_seconds: 3600,
        });

        assert!(limiter.is_allowed("a").await);
        assert!(!limiter.is_allowed("a").await);
        assert!(limiter.is_allowed("b").await);

        assert_eq!(limiter.tracked_keys().await, 2);
        assert!(!limiter.is_allowed("a").await);
    }
}
