//! In-process cache of session resolutions
//!
//! Memoizes successful session lookups for a short window so steady-state
//! request traffic does not pay a database round trip per request. The cache
//! is advisory only: the `sessions` table remains the source of truth, and a
//! lost or restarted cache merely costs one extra lookup per session.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

/// Auth cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a cached resolution stays usable
    pub ttl: Duration,
    /// How often the background sweep runs
    pub sweep_interval: Duration,
}

impl CacheConfig {
    /// Create a new CacheConfig from environment variables
    ///
    /// # Environment Variables
    /// - `AUTH_CACHE_TTL_SECONDS`: entry lifetime (default: 300)
    /// - `AUTH_CACHE_SWEEP_SECONDS`: sweep period (default: 60)
    pub fn from_env() -> Self {
        let ttl = std::env::var("AUTH_CACHE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);

        let sweep_interval = std::env::var("AUTH_CACHE_SWEEP_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        Self {
            ttl: Duration::from_secs(ttl),
            sweep_interval: Duration::from_secs(sweep_interval),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// A cached session resolution
#[derive(Debug, Clone)]
pub struct CachedAuth {
    pub user_id: i32,
    pub username: String,
}

#[derive(Debug)]
struct CacheEntry {
    auth: CachedAuth,
    cached_until: Instant,
}

/// TTL-bounded map from session identifier to resolved user
#[derive(Clone)]
pub struct AuthCache {
    ttl: Duration,
    sweep_interval: Duration,
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl AuthCache {
    /// Create a new auth cache
    pub fn new(config: CacheConfig) -> Self {
        Self {
            ttl: config.ttl,
            sweep_interval: config.sweep_interval,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Look up a session identifier, evicting the entry if it has expired
    pub async fn get(&self, sid: &str) -> Option<CachedAuth> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        match entries.get(sid) {
            Some(entry) if entry.cached_until > now => Some(entry.auth.clone()),
            Some(_) => {
                entries.remove(sid);
                None
            }
            None => None,
        }
    }

    /// Store a resolution with a fresh TTL
    pub async fn put(&self, sid: &str, auth: CachedAuth) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            sid.to_string(),
            CacheEntry {
                auth,
                cached_until: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop an entry, if present
    pub async fn invalidate(&self, sid: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(sid);
    }

    /// Remove all expired entries, returning how many were evicted
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.cached_until > now);
        before - entries.len()
    }

    /// Run the periodic sweep until the process exits
    ///
    /// Bounds memory growth independent of traffic shape; lazy eviction on
    /// `get` alone would keep entries for sessions that never return.
    pub async fn run_sweeper(self) {
        let mut interval = tokio::time::interval(self.sweep_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let evicted = self.sweep().await;
            if evicted > 0 {
                debug!("Auth cache sweep evicted {} entries", evicted);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with_ttl(secs: u64) -> AuthCache {
        AuthCache::new(CacheConfig {
            ttl: Duration::from_secs(secs),
            sweep_interval: Duration::from_secs(60),
        })
    }

    fn auth(user_id: i32) -> CachedAuth {
        CachedAuth {
            user_id,
            username: format!("user{user_id}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hit_within_ttl() {
        let cache = cache_with_ttl(300);
        cache.put("sid-1", auth(1)).await;

        tokio::time::advance(Duration::from_secs(299)).await;
        let hit = cache.get("sid-1").await.unwrap();
        assert_eq!(hit.user_id, 1);
        assert_eq!(hit.username, "user1");
    }

    #[tokio::test(start_paused = true)]
    async fn miss_after_ttl() {
        let cache = cache_with_ttl(300);
        cache.put("sid-1", auth(1)).await;

        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(cache.get("sid-1").await.is_none());
        // lazy eviction removed the entry entirely
        assert_eq!(cache.sweep().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired() {
        let cache = cache_with_ttl(300);
        cache.put("old", auth(1)).await;
        tokio::time::advance(Duration::from_secs(200)).await;
        cache.put("fresh", auth(2)).await;
        tokio::time::advance(Duration::from_secs(150)).await;

        assert_eq!(cache.sweep().await, 1);
        assert!(cache.get("old").await.is_none());
        assert_eq!(cache.get("fresh").await.unwrap().user_id, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_drops_entry() {
        let cache = cache_with_ttl(300);
        cache.put("sid-1", auth(1)).await;
        cache.invalidate("sid-1").await;
        assert!(cache.get("sid-1").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn put_refreshes_ttl() {
        let cache = cache_with_ttl(300);
        cache.put("sid-1", auth(1)).await;
        tokio::time::advance(Duration::from_secs(200)).await;
        cache.put("sid-1", auth(1)).await;
        tokio::time::advance(Duration::from_secs(200)).await;

        assert!(cache.get("sid-1").await.is_some());
    }
}
