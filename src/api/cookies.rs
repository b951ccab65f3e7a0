//! Cookie construction.
//!
//! All cookies are HttpOnly on path `/`, with `Secure` and `Domain` taken
//! from `[auth]`. Only the session cookie follows `cookie_same_site`. The
//! OAuth state and return-to cookies are added through a signed jar by the
//! handlers.

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};

use crate::config::{AuthConfig, SameSitePolicy};
use crate::oauth::sanitize_return_to;

pub const SESSION_COOKIE: &str = "sb_session";
pub const OAUTH_STATE_COOKIE: &str = "sb_oauth_state";
pub const RETURN_TO_COOKIE: &str = "sb_return_to";

/// Lifetime of the OAuth state and return-to cookies, in seconds
pub const OAUTH_COOKIE_TTL_SECS: i64 = 600;

fn configured_same_site(config: &AuthConfig) -> SameSite {
    match config.cookie_same_site {
        SameSitePolicy::Lax => SameSite::Lax,
        SameSitePolicy::Strict => SameSite::Strict,
    }
}

fn build(
    name: &'static str,
    value: String,
    same_site: SameSite,
    config: &AuthConfig,
) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(same_site)
        .build();
    if let Some(domain) = config.cookie_domain.as_deref().filter(|d| !d.is_empty()) {
        cookie.set_domain(domain.to_string());
    }
    cookie
}

/// Session cookie living exactly until the session expires.
pub fn session(token: String, expires_at: DateTime<Utc>, config: &AuthConfig) -> Cookie<'static> {
    let remaining = (expires_at - Utc::now()).num_seconds().max(0);
    let mut cookie = build(SESSION_COOKIE, token, configured_same_site(config), config);
    cookie.set_max_age(time::Duration::seconds(remaining));
    cookie
}

/// Always `SameSite=Lax`: the provider's redirect back to the callback is a
/// cross-site navigation, on which browsers withhold `Strict` cookies.
pub fn oauth_state(state: String, config: &AuthConfig) -> Cookie<'static> {
    let mut cookie = build(OAUTH_STATE_COOKIE, state, SameSite::Lax, config);
    cookie.set_max_age(time::Duration::seconds(OAUTH_COOKIE_TTL_SECS));
    cookie
}

/// The path is base64url-encoded; query strings and fragments are not valid
/// cookie octets. `SameSite=Lax` like the state cookie.
pub fn return_to(path: &str, config: &AuthConfig) -> Cookie<'static> {
    let mut cookie = build(
        RETURN_TO_COOKIE,
        URL_SAFE_NO_PAD.encode(path),
        SameSite::Lax,
        config,
    );
    cookie.set_max_age(time::Duration::seconds(OAUTH_COOKIE_TTL_SECS));
    cookie
}

/// Decode a return-to cookie value. The result is re-sanitized.
pub fn decode_return_to(value: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
    let path = String::from_utf8(bytes).ok()?;
    Some(sanitize_return_to(&path))
}

/// Removal cookie carrying the same path and domain as the original.
pub fn removal(name: &'static str, config: &AuthConfig) -> Cookie<'static> {
    let same_site = if name == SESSION_COOKIE {
        configured_same_site(config)
    } else {
        SameSite::Lax
    };
    build(name, String::new(), same_site, config)
}
