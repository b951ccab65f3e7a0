//! Server-side session store.
//!
//! The client only ever sees a random bearer token; the table keeps its
//! SHA-256 so a leaked database cannot be replayed as cookies.

use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{DbPool, Session};

/// Generate a random token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Clone)]
pub struct SessionStore {
    db: DbPool,
}

impl SessionStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Create a session for `user_id` and return the bearer token.
    pub async fn create(&self, user_id: &str, expires_at: DateTime<Utc>) -> sqlx::Result<String> {
        let token = generate_token();
        let session_id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&session_id)
        .bind(user_id)
        .bind(hash_token(&token))
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        debug!(session_id = %session_id, user_id = %user_id, "Session created");
        Ok(token)
    }

    /// Look up the session behind a token. Expired rows are returned as `None`
    /// even though they still exist until the next sweep.
    pub async fn find_live(&self, token: &str, now: DateTime<Utc>) -> sqlx::Result<Option<Session>> {
        if token.is_empty() {
            return Ok(None);
        }

        let session: Option<Session> = sqlx::query_as("SELECT * FROM sessions WHERE token_hash = ?")
            .bind(hash_token(token))
            .fetch_optional(&self.db)
            .await?;

        Ok(session.filter(|s| s.is_live_at(now)))
    }

    /// Resolve a token to the owning user id.
    pub async fn resolve_user_id(&self, token: &str) -> sqlx::Result<Option<String>> {
        Ok(self
            .find_live(token, Utc::now())
            .await?
            .map(|session| session.user_id))
    }

    /// Delete the session behind a token. Unknown tokens are not an error.
    pub async fn delete(&self, token: &str) -> sqlx::Result<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(hash_token(token))
            .execute(&self.db)
            .await?;

        debug!(deleted = result.rows_affected(), "Session revoked");
        Ok(())
    }

    /// Remove every session whose expiry is at or before `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.db)
            .await?;

        debug!(deleted = result.rows_affected(), "Purged expired sessions");
        Ok(result.rows_affected())
    }
}
