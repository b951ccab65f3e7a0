//! User directory: local identities keyed by email.

use chrono::Utc;
use tracing::debug;

use super::{DbPool, Role, User};

#[derive(Clone)]
pub struct UserStore {
    db: DbPool,
}

impl UserStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Insert a user for `email`, or refresh the profile fields of the user who
    /// already owns that email (compared case-insensitively). Returns the id.
    pub async fn upsert_by_email(
        &self,
        email: &str,
        display_name: &str,
        avatar_url: Option<&str>,
        email_verified: bool,
    ) -> sqlx::Result<String> {
        let email = email.trim();
        if email.is_empty() {
            return Err(sqlx::Error::Protocol(
                "email is required to upsert user".to_string(),
            ));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let (user_id,): (String,) = sqlx::query_as(
            r#"
            INSERT INTO users (id, display_name, avatar_url, email, email_lower, email_verified, role, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 'member', 1, ?, ?)
            ON CONFLICT(email_lower) DO UPDATE SET
                display_name = excluded.display_name,
                avatar_url = excluded.avatar_url,
                email_verified = excluded.email_verified,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(&id)
        .bind(display_name)
        .bind(avatar_url)
        .bind(email)
        .bind(email.to_lowercase())
        .bind(email_verified)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        debug!(user_id = %user_id, created = (user_id == id), "Upserted user");
        Ok(user_id)
    }

    pub async fn get_by_id(&self, user_id: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn get_by_email(&self, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as("SELECT * FROM users WHERE email_lower = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.db)
            .await
    }

    /// Returns false when no user has that id.
    pub async fn set_role(&self, user_id: &str, role: Role) -> sqlx::Result<bool> {
        let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deactivation takes effect on the next request of every session the user
    /// holds; session rows are left alone.
    pub async fn set_active(&self, user_id: &str, active: bool) -> sqlx::Result<bool> {
        let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
