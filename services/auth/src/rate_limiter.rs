//! Throttling of failed login attempts
//!
//! Keyed by the submitted login identifier. Repeated failures inside the
//! window lock the key out; a successful login clears it. State is
//! process-local, like the auth cache.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::warn;

/// Throttle configuration
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Failures tolerated inside the window before lockout
    pub max_failures: u32,
    /// Length of the failure-counting window
    pub window: Duration,
    /// How long a locked-out key stays locked
    pub lockout: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window: Duration::from_secs(300),
            lockout: Duration::from_secs(900),
        }
    }
}

#[derive(Debug)]
struct AttemptWindow {
    failures: u32,
    window_start: Instant,
    locked_until: Option<Instant>,
}

/// Windowed login throttle
#[derive(Clone)]
pub struct LoginThrottle {
    config: ThrottleConfig,
    entries: Arc<Mutex<HashMap<String, AttemptWindow>>>,
}

impl LoginThrottle {
    /// Create a new login throttle
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether a login attempt for this key may proceed
    pub async fn check(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let Some(entry) = entries.get(key) else {
            return true;
        };

        match entry.locked_until {
            Some(locked_until) if locked_until > now => false,
            Some(_) => {
                // lockout served
                entries.remove(key);
                true
            }
            None => true,
        }
    }

    /// Record a failed attempt for this key
    pub async fn record_failure(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(AttemptWindow {
            failures: 0,
            window_start: now,
            locked_until: None,
        });

        if now.duration_since(entry.window_start) > self.config.window {
            entry.failures = 0;
            entry.window_start = now;
        }

        entry.failures += 1;
        if entry.failures >= self.config.max_failures && entry.locked_until.is_none() {
            entry.locked_until = Some(now + self.config.lockout);
            warn!(
                "Login throttle locked out key after {} failures",
                entry.failures
            );
        }
    }

    /// Forget a key after a successful login
    pub async fn clear(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle() -> LoginThrottle {
        LoginThrottle::new(ThrottleConfig {
            max_failures: 3,
            window: Duration::from_secs(300),
            lockout: Duration::from_secs(900),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn allows_until_max_failures() {
        let throttle = throttle();

        for _ in 0..2 {
            assert!(throttle.check("alice").await);
            throttle.record_failure("alice").await;
        }
        assert!(throttle.check("alice").await);

        throttle.record_failure("alice").await;
        assert!(!throttle.check("alice").await);
    }

    #[tokio::test(start_paused = true)]
    async fn lockout_expires() {
        let throttle = throttle();
        for _ in 0..3 {
            throttle.record_failure("alice").await;
        }
        assert!(!throttle.check("alice").await);

        tokio::time::advance(Duration::from_secs(901)).await;
        assert!(throttle.check("alice").await);
    }

    #[tokio::test(start_paused = true)]
    async fn success_clears_failures() {
        let throttle = throttle();
        throttle.record_failure("alice").await;
        throttle.record_failure("alice").await;
        throttle.clear("alice").await;

        throttle.record_failure("alice").await;
        assert!(throttle.check("alice").await);
    }

    #[tokio::test(start_paused = true)]
    async fn window_expiry_resets_count() {
        let throttle = throttle();
        throttle.record_failure("alice").await;
        throttle.record_failure("alice").await;

        tokio::time::advance(Duration::from_secs(301)).await;
        throttle.record_failure("alice").await;
        assert!(throttle.check("alice").await);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let throttle = throttle();
        for _ in 0..3 {
            throttle.record_failure("alice").await;
        }
        assert!(!throttle.check("alice").await);
        assert!(throttle.check("bob").await);
    }
}
