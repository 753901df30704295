//! Session model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Session entity as stored in the `sessions` table
///
/// `sid` is the opaque identifier handed to clients; `payload` is a
/// denormalized snapshot of the owning user at login time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub sid: String,
    pub user_id: i32,
    pub payload: serde_json::Value,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is still live at the given instant
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// New session creation payload
#[derive(Debug, Clone)]
pub struct NewSession {
    pub sid: String,
    pub user_id: i32,
    pub payload: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}
