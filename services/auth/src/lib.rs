//! Maly identity service
//!
//! Credential verification, durable database-backed sessions, and
//! per-request identity resolution across the multiple credential surfaces
//! Maly clients use (signed cookie, plain cookies, headers, query string).

pub mod cache;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod validation;

use std::path::PathBuf;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sqlx::PgPool;

use crate::cache::{AuthCache, CacheConfig};
use crate::identity::IdentityResolver;
use crate::rate_limiter::{LoginThrottle, ThrottleConfig};
use crate::repositories::UserRepository;
use crate::session::{SessionConfig, SessionStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: UserRepository,
    pub sessions: SessionStore,
    pub cache: AuthCache,
    pub resolver: IdentityResolver,
    pub throttle: LoginThrottle,
    pub session_config: SessionConfig,
    pub cookie_key: Key,
    pub upload_dir: PathBuf,
}

impl AppState {
    /// Assemble the service state from its configuration
    pub fn new(
        pool: PgPool,
        session_config: SessionConfig,
        cache_config: CacheConfig,
        upload_dir: PathBuf,
    ) -> Self {
        let cookie_key = Key::derive_from(session_config.secret.as_bytes());
        let sessions = SessionStore::new(pool.clone(), &session_config);
        let cache = AuthCache::new(cache_config);
        let resolver = IdentityResolver::new(sessions.clone(), cache.clone(), cookie_key.clone());

        Self {
            user_repository: UserRepository::new(pool),
            sessions,
            cache,
            resolver,
            throttle: LoginThrottle::new(ThrottleConfig::default()),
            session_config,
            cookie_key,
            upload_dir,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.cookie_key.clone()
    }
}
