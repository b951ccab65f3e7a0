//! Login, logout and identity endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{CookieJar, SignedCookieJar};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::cookies::{self, OAUTH_STATE_COOKIE, RETURN_TO_COOKIE, SESSION_COOKIE};
use super::error::ApiError;
use super::middleware::CurrentUser;
use super::OkResponse;
use crate::db::UserResponse;
use crate::oauth::{random_state, sanitize_return_to, states_match, IdentityProvider};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StartParams {
    #[serde(rename = "returnTo")]
    pub return_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Response for `GET /me`
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

/// The configured provider, if it answers to `name`.
fn provider_named<'a>(
    state: &'a AppState,
    name: &str,
) -> Result<&'a Arc<dyn IdentityProvider>, ApiError> {
    let provider = state.auth.provider().map_err(|e| state.error(e))?;
    if provider.name() != name {
        return Err(ApiError::not_found(format!("Unknown identity provider: {}", name)));
    }
    Ok(provider)
}

/// Start a login: remember an anti-forgery state and the return path in
/// signed cookies, then send the browser to the provider.
pub async fn start(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<StartParams>,
) -> Result<Response, ApiError> {
    let provider = provider_named(&state, &provider)?;

    let oauth_state = random_state();
    let return_to = sanitize_return_to(params.return_to.as_deref().unwrap_or_default());

    let jar = SignedCookieJar::new(state.cookie_key.clone())
        .add(cookies::oauth_state(oauth_state.clone(), &state.config.auth))
        .add(cookies::return_to(&return_to, &state.config.auth));

    let location = provider.authorization_url(&oauth_state);
    debug!(provider = provider.name(), "Redirecting to identity provider");

    Ok((StatusCode::FOUND, jar, [(header::LOCATION, location)]).into_response())
}

/// Finish a login. Every failure is answered with a JSON error body.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = provider_named(&state, &provider) {
        return err.into_response();
    }

    let signed = SignedCookieJar::from_headers(&headers, state.cookie_key.clone());

    let Some(expected) = signed
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
    else {
        return ApiError::bad_request("Missing oauth state cookie").into_response();
    };

    if !states_match(&expected, params.state.as_deref().unwrap_or_default()) {
        return ApiError::bad_request("Invalid oauth state").into_response();
    }

    let code = params.code.unwrap_or_default();
    if code.is_empty() {
        return ApiError::bad_request("Missing code").into_response();
    }

    // The state is single-use from here on
    let signed = signed.remove(cookies::removal(OAUTH_STATE_COOKIE, &state.config.auth));

    let issued = match state.auth.login_with_provider(&code).await {
        Ok(issued) => issued,
        Err(err) => return (signed, state.error(err)).into_response(),
    };

    let return_to = signed
        .get(RETURN_TO_COOKIE)
        .and_then(|cookie| cookies::decode_return_to(cookie.value()))
        .unwrap_or_else(|| "/".to_string());
    let signed = signed.remove(cookies::removal(RETURN_TO_COOKIE, &state.config.auth));

    let jar = CookieJar::new().add(cookies::session(
        issued.token,
        issued.expires_at,
        &state.config.auth,
    ));

    (StatusCode::FOUND, signed, jar, [(header::LOCATION, return_to)]).into_response()
}

/// Revoke the caller's session. Succeeds whether or not one existed.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<OkResponse>), ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .unwrap_or_default();

    state.auth.logout(&token).await.map_err(|e| state.error(e))?;

    let jar = jar.remove(cookies::removal(SESSION_COOKIE, &state.config.auth));
    Ok((jar, Json(OkResponse::ok())))
}

pub async fn me(current: CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        authenticated: current.user().is_some(),
        user: current.0.map(UserResponse::from),
    })
}
