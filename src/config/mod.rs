use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deployment environment name. Internal error details are only exposed
    /// to clients outside of "production".
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    "development".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite:./data/guidepost.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Lax,
    Strict,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of a login session in days (default: 14)
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,
    #[serde(default)]
    pub cookie_secure: bool,
    pub cookie_domain: Option<String>,
    #[serde(default = "default_same_site")]
    pub cookie_same_site: SameSitePolicy,
    /// Secret used to sign the short-lived OAuth cookies
    #[serde(default = "default_cookie_secret")]
    pub cookie_secret: String,
}

impl AuthConfig {
    pub fn session_ttl(&self) -> chrono::Duration {
        if self.session_ttl_days <= 0 {
            chrono::Duration::days(default_session_ttl_days())
        } else {
            chrono::Duration::days(self.session_ttl_days)
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: default_session_ttl_days(),
            cookie_secure: false,
            cookie_domain: None,
            cookie_same_site: default_same_site(),
            cookie_secret: default_cookie_secret(),
        }
    }
}

fn default_session_ttl_days() -> i64 {
    14
}

fn default_same_site() -> SameSitePolicy {
    SameSitePolicy::Lax
}

fn default_cookie_secret() -> String {
    // Random per process if not provided; pending logins do not survive a restart
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub discord: Option<DiscordConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// OAuth redirect URL (callback URL registered with Discord)
    pub redirect_url: String,
    #[serde(default = "default_discord_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_discord_token_url")]
    pub token_url: String,
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
}

impl DiscordConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            authorize_url: default_discord_authorize_url(),
            token_url: default_discord_token_url(),
            api_base: default_discord_api_base(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.redirect_url.is_empty()
    }
}

fn default_discord_authorize_url() -> String {
    "https://discord.com/api/oauth2/authorize".to_string()
}

fn default_discord_token_url() -> String {
    "https://discord.com/api/oauth2/token".to_string()
}

fn default_discord_api_base() -> String {
    "https://discord.com/api".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    /// Apply deployment overrides from the environment. `lookup` is injected so
    /// tests do not have to mutate the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(env) = non_empty("GUIDEPOST_ENV") {
            self.server.environment = env;
        }
        if let Some(secure) = non_empty("COOKIE_SECURE") {
            self.auth.cookie_secure = secure.eq_ignore_ascii_case("true") || secure == "1";
        }
        if let Some(domain) = non_empty("COOKIE_DOMAIN") {
            self.auth.cookie_domain = Some(domain);
        }
        if let Some(secret) = non_empty("COOKIE_SECRET") {
            self.auth.cookie_secret = secret;
        }

        let client_id = non_empty("DISCORD_CLIENT_ID");
        let client_secret = non_empty("DISCORD_CLIENT_SECRET");
        let redirect_url = non_empty("DISCORD_REDIRECT_URL");
        if client_id.is_some() || client_secret.is_some() || redirect_url.is_some() {
            let discord = self
                .oauth
                .discord
                .get_or_insert_with(|| DiscordConfig::new("", "", ""));
            if let Some(v) = client_id {
                discord.client_id = v;
            }
            if let Some(v) = client_secret {
                discord.client_secret = v;
            }
            if let Some(v) = redirect_url {
                discord.redirect_url = v;
            }
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            oauth: OAuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
