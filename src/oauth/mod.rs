//! Identity provider integration.
//!
//! This module provides:
//! - The `IdentityProvider` trait driven by the auth service
//! - A Discord implementation of the authorization-code flow
//! - Helpers for the cookie-carried anti-forgery state and post-login redirect

pub mod discord;

pub use discord::DiscordProvider;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use reqwest::Url;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::OAuthConfig;

/// Post-login redirect targets longer than this are discarded.
pub const MAX_RETURN_TO_LEN: usize = 2000;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("profile fetch failed: {0}")]
    ProfileFetchFailed(String),
}

/// Access token returned by the provider. Never logged.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// Remote account as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderProfile {
    pub external_id: String,
    pub username: String,
    /// Preferred display name, when the account has one
    pub display_name_override: Option<String>,
    pub email: Option<String>,
    pub email_verified: bool,
    pub avatar_asset_id: Option<String>,
}

impl ProviderProfile {
    /// Preferred name, falling back to the username.
    pub fn display_name(&self) -> &str {
        self.display_name_override
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// Three-legged OAuth2 handshake against a single identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Path segment under `/auth/` this provider answers to.
    fn name(&self) -> &str;

    /// URL the browser is sent to. Pure; no network access.
    fn authorization_url(&self, state: &str) -> String;

    /// Trade an authorization code for an access token. Codes are single-use,
    /// so this is never retried.
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError>;

    async fn fetch_profile(&self, token: &AccessToken) -> Result<ProviderProfile, ProviderError>;

    /// Avatar URL derived from the profile's asset id, if it has one.
    fn avatar_url(&self, _profile: &ProviderProfile) -> Option<String> {
        None
    }
}

/// Build the configured identity provider. An absent or partial Discord
/// section leaves login disabled rather than failing startup.
pub fn from_config(config: &OAuthConfig) -> anyhow::Result<Option<Arc<dyn IdentityProvider>>> {
    let Some(discord) = config.discord.as_ref() else {
        warn!("No identity provider configured; login is disabled");
        return Ok(None);
    };
    if !discord.is_complete() {
        warn!("Discord OAuth is missing client_id, client_secret or redirect_url; login is disabled");
        return Ok(None);
    }

    let provider = DiscordProvider::new(discord.clone())?;
    info!(provider = provider.name(), "Identity provider configured");
    Ok(Some(Arc::new(provider)))
}

/// Random anti-forgery value: 32 bytes, base64url without padding.
pub fn random_state() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compare the callback `state` against the cookie value in constant time.
pub fn states_match(expected: &str, got: &str) -> bool {
    !got.is_empty() && expected.as_bytes().ct_eq(got.as_bytes()).into()
}

/// Reduce a caller-supplied redirect target to a same-origin relative path.
/// Anything else becomes `/`.
pub fn sanitize_return_to(raw: &str) -> String {
    const FALLBACK: &str = "/";
    const PLACEHOLDER_HOST: &str = "return-to.invalid";

    if raw.is_empty() || raw.chars().count() > MAX_RETURN_TO_LEN || !raw.starts_with('/') {
        return FALLBACK.to_string();
    }

    // Parses on its own only when it carries a scheme
    if Url::parse(raw).is_ok() {
        return FALLBACK.to_string();
    }

    // Resolving against a placeholder origin exposes `//host`, `/\host` and friends
    let base = match Url::parse(&format!("http://{}/", PLACEHOLDER_HOST)) {
        Ok(base) => base,
        Err(_) => return FALLBACK.to_string(),
    };
    match base.join(raw) {
        Ok(resolved)
            if resolved.scheme() == "http"
                && resolved.host_str() == Some(PLACEHOLDER_HOST)
                && resolved.port().is_none()
                && resolved.username().is_empty()
                && resolved.password().is_none() =>
        {
            raw.to_string()
        }
        _ => FALLBACK.to_string(),
    }
}
