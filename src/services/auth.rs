//! Login, logout and session resolution.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{ServiceError, ServiceResult};
use crate::db::{SessionStore, User, UserStore};
use crate::oauth::IdentityProvider;

/// A freshly issued login session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of resolving a session cookie.
#[derive(Debug)]
pub enum SessionLookup {
    Active(User),
    /// Unknown or expired token, missing user, or deactivated user
    Invalid,
}

#[derive(Clone)]
pub struct AuthService {
    provider: Option<Arc<dyn IdentityProvider>>,
    users: UserStore,
    sessions: SessionStore,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        provider: Option<Arc<dyn IdentityProvider>>,
        users: UserStore,
        sessions: SessionStore,
        session_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            users,
            sessions,
            session_ttl,
        }
    }

    pub fn provider(&self) -> ServiceResult<&Arc<dyn IdentityProvider>> {
        self.provider
            .as_ref()
            .ok_or(ServiceError::NotConfigured("identity provider"))
    }

    /// Complete an authorization-code login and issue a session.
    pub async fn login_with_provider(&self, code: &str) -> ServiceResult<IssuedSession> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ServiceError::invalid("missing code"));
        }

        let provider = self.provider()?;
        let access_token = provider.exchange_code(code).await?;
        let profile = provider.fetch_profile(&access_token).await?;

        let display_name = profile.display_name().to_string();
        let avatar_url = provider.avatar_url(&profile);

        let email = profile
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| {
                warn!(provider = provider.name(), "Profile returned without an email");
                ServiceError::MissingEmailScope
            })?;

        let user_id = self
            .users
            .upsert_by_email(email, &display_name, avatar_url.as_deref(), profile.email_verified)
            .await?;

        let expires_at = Utc::now() + self.session_ttl;
        let token = self.sessions.create(&user_id, expires_at).await?;

        info!(user_id = %user_id, provider = provider.name(), "User logged in");
        Ok(IssuedSession {
            token,
            user_id,
            expires_at,
        })
    }

    /// Revoke a session. Empty and unknown tokens are not errors.
    pub async fn logout(&self, token: &str) -> ServiceResult<()> {
        if token.is_empty() {
            return Ok(());
        }
        self.sessions.delete(token).await?;
        Ok(())
    }

    /// Map a session token to its active user. Storage failures are returned
    /// as errors so the caller can tell them apart from an invalid session.
    pub async fn resolve_session(&self, token: &str) -> ServiceResult<SessionLookup> {
        let Some(user_id) = self.sessions.resolve_user_id(token).await? else {
            return Ok(SessionLookup::Invalid);
        };

        match self.users.get_by_id(&user_id).await? {
            Some(user) if user.is_active => Ok(SessionLookup::Active(user)),
            Some(_) => {
                debug!(user_id = %user_id, "Session belongs to a deactivated user");
                Ok(SessionLookup::Invalid)
            }
            None => Ok(SessionLookup::Invalid),
        }
    }
}
