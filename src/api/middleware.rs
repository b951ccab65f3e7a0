//! Per-request session resolution.
//!
//! The middleware turns the session cookie into a [`CurrentUser`] request
//! extension. It never rejects a request; handlers that need a user take the
//! [`AuthUser`] extractor instead.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

use super::cookies::{self, SESSION_COOKIE};
use super::error::ApiError;
use crate::db::User;
use crate::services::SessionLookup;
use crate::AppState;

/// The resolved identity of the caller, if any. Only the session middleware
/// inserts it.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().cloned().unwrap_or_default())
    }
}

/// Extractor for handlers that require a signed-in, active user
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .and_then(|current| current.0.clone())
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Does the response already set (or clear) the named cookie?
fn sets_cookie(response: &Response, name: &str) -> bool {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}

pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty());

    let Some(token) = token else {
        request.extensions_mut().insert(CurrentUser::default());
        return next.run(request).await;
    };

    match state.auth.resolve_session(&token).await {
        Ok(SessionLookup::Active(user)) => {
            request.extensions_mut().insert(CurrentUser(Some(user)));
            let mut response = next.run(request).await;
            // Identity-bearing responses must not be shared between clients
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            response
        }
        Ok(SessionLookup::Invalid) => {
            debug!("Clearing stale session cookie");
            request.extensions_mut().insert(CurrentUser::default());
            let response = next.run(request).await;

            // A handler that issued a fresh session wins over the stale clear
            if sets_cookie(&response, SESSION_COOKIE) {
                return response;
            }
            let jar = jar.remove(cookies::removal(SESSION_COOKIE, &state.config.auth));
            (jar, response).into_response()
        }
        Err(err) => {
            // The session may well be valid; keep the cookie for the next request
            warn!(error = %err, "Session lookup failed, continuing anonymously");
            request.extensions_mut().insert(CurrentUser::default());
            next.run(request).await
        }
    }
}
