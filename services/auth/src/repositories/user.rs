//! User repository: account persistence and credential verification

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::models::{NewUser, User};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user, hashing the password before persistence
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        info!("Creating new user: {}", new_user.username);

        let salt = SaltString::generate(&mut rand::thread_rng());
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(new_user.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, profile_image)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, profile_image, created_at, updated_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&password_hash)
        .bind(&new_user.profile_image)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by login identifier
    ///
    /// Identifiers containing `@` are looked up by email, everything else by
    /// username.
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        let column = if identifier.contains('@') {
            "email"
        } else {
            "username"
        };

        let query = format!(
            "SELECT id, username, email, password_hash, profile_image, created_at, updated_at \
             FROM users WHERE {column} = $1"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, profile_image, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Verify a plaintext password against a user's stored hash
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

        let argon2 = Argon2::default();
        Ok(argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Check a login identifier and password against the credential store
    ///
    /// Unknown identifier and wrong password both resolve to `Ok(None)`; the
    /// caller surfaces a single generic rejection so responses cannot be
    /// used to enumerate accounts. Only datastore failures are errors.
    pub async fn verify_credentials(&self, identifier: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.find_by_identifier(identifier).await? else {
            warn!("Login rejected: unknown identifier");
            return Ok(None);
        };

        if self.verify_password(&user, password)? {
            Ok(Some(user))
        } else {
            warn!("Login rejected: password mismatch for user {}", user.id);
            Ok(None)
        }
    }
}
