//! Discord OAuth2 client.
//!
//! Authorization-code flow with the `identify email` scopes. The token and
//! profile endpoints are configurable so the client can be pointed at a
//! local stand-in.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{AccessToken, IdentityProvider, ProviderError, ProviderProfile};
use crate::config::DiscordConfig;

const SCOPES: &str = "identify email";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const AVATAR_CDN: &str = "https://cdn.discordapp.com/avatars";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    global_name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    verified: Option<bool>,
    avatar: Option<String>,
}

pub struct DiscordProvider {
    config: DiscordConfig,
    authorize_url: Url,
    client: reqwest::Client,
}

impl DiscordProvider {
    pub fn new(config: DiscordConfig) -> Result<Self> {
        if !config.is_complete() {
            anyhow::bail!("Discord OAuth requires client_id, client_secret and redirect_url");
        }

        let authorize_url = Url::parse(&config.authorize_url)
            .with_context(|| format!("Invalid Discord authorize URL: {}", config.authorize_url))?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("guidepost/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            authorize_url,
            client,
        })
    }

    fn profile_url(&self) -> String {
        format!("{}/users/@me", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl IdentityProvider for DiscordProvider {
    fn name(&self) -> &str {
        "discord"
    }

    fn authorization_url(&self, state: &str) -> String {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", SCOPES)
            .append_pair("state", state);
        url.into()
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError> {
        let response = self
            .client
            .post(&self.config.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::ExchangeFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Discord token exchange rejected");
            return Err(ProviderError::ExchangeFailed(format!("{} - {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ExchangeFailed(format!("invalid token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(ProviderError::ExchangeFailed("empty access token".to_string()));
        }

        debug!("Exchanged Discord authorization code");
        Ok(AccessToken::new(token.access_token))
    }

    async fn fetch_profile(&self, token: &AccessToken) -> Result<ProviderProfile, ProviderError> {
        let response = self
            .client
            .get(self.profile_url())
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| ProviderError::ProfileFetchFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::ProfileFetchFailed(format!(
                "discord /users/@me failed: {}",
                status
            )));
        }

        let user: DiscordUser = response
            .json()
            .await
            .map_err(|e| ProviderError::ProfileFetchFailed(format!("invalid profile: {}", e)))?;

        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

        Ok(ProviderProfile {
            external_id: user.id,
            username: user.username,
            display_name_override: non_empty(user.global_name),
            email: non_empty(user.email),
            email_verified: user.verified.unwrap_or(false),
            avatar_asset_id: non_empty(user.avatar),
        })
    }

    fn avatar_url(&self, profile: &ProviderProfile) -> Option<String> {
        profile.avatar_asset_id.as_ref().map(|asset| {
            format!("{}/{}/{}.png?size=128", AVATAR_CDN, profile.external_id, asset)
        })
    }
}
