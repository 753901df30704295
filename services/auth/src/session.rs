//! Durable session management backed by the `sessions` table
//!
//! A session binds an opaque identifier to a user and an expiry. The row is
//! the single source of truth for authentication state; cookies and headers
//! only carry the identifier.

use anyhow::Result;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Session, User};

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret used to derive the signing key for the framework cookie
    pub secret: String,
    /// Session lifetime in days
    pub ttl_days: i64,
    /// Whether cookies are marked Secure
    pub secure_cookies: bool,
}

impl SessionConfig {
    /// Create a new SessionConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SESSION_SECRET`: cookie signing secret, at least 32 bytes
    /// - `SESSION_TTL_DAYS`: session lifetime in days (default: 30)
    /// - `SECURE_COOKIES`: mark cookies Secure (default: false)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| {
            "maly-dev-session-secret-change-me-in-production-0123456789abcdef".to_string()
        });

        if secret.len() < 32 {
            anyhow::bail!("SESSION_SECRET must be at least 32 bytes");
        }

        let ttl_days = std::env::var("SESSION_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let secure_cookies = std::env::var("SECURE_COOKIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(false);

        Ok(Self {
            secret,
            ttl_days,
            secure_cookies,
        })
    }
}

/// Store for durable sessions
#[derive(Clone)]
pub struct SessionStore {
    pool: PgPool,
    ttl: Duration,
}

impl SessionStore {
    /// Create a new session store
    pub fn new(pool: PgPool, config: &SessionConfig) -> Self {
        Self {
            pool,
            ttl: Duration::days(config.ttl_days),
        }
    }

    /// Establish a session for a verified user
    ///
    /// Purges the user's expired sessions, upserts a fresh row with a new
    /// expiry and payload snapshot, then reads the row back. Establishment
    /// fails if the row cannot be observed after the write; a login must
    /// never report success without a persisted backing record.
    pub async fn establish(&self, user: &User) -> Result<Session> {
        let sid = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + self.ttl;
        let payload = serde_json::json!({
            "username": user.username,
            "email": user.email,
            "last_login": Utc::now(),
        });

        let purged = self.purge_expired_for_user(user.id).await?;
        if purged > 0 {
            debug!("Purged {} expired session(s) for user {}", purged, user.id);
        }

        sqlx::query(
            r#"
            INSERT INTO sessions (sid, user_id, payload, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (sid) DO UPDATE
            SET user_id = EXCLUDED.user_id,
                payload = EXCLUDED.payload,
                expires_at = EXCLUDED.expires_at,
                updated_at = now()
            "#,
        )
        .bind(&sid)
        .bind(user.id)
        .bind(&payload)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        let session = self
            .find_valid(&sid)
            .await?
            .ok_or_else(|| anyhow::anyhow!("session {} not persisted after insert", sid))?;

        info!("Session established for user {}", user.id);
        Ok(session)
    }

    /// Look up a session that has not yet expired
    pub async fn find_valid(&self, sid: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT sid, user_id, payload, expires_at, created_at, updated_at
            FROM sessions
            WHERE sid = $1 AND expires_at > now()
            "#,
        )
        .bind(sid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Destroy a session
    pub async fn delete(&self, sid: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE sid = $1")
            .bind(sid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a user's expired sessions
    pub async fn purge_expired_for_user(&self, user_id: i32) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND expires_at <= now()")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
