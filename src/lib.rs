pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod oauth;
pub mod services;

pub use db::DbPool;

use axum_extra::extract::cookie::Key;
use config::Config;
use sha2::{Digest, Sha512};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::db::{GuideStore, SessionStore, UserStore};
use crate::oauth::IdentityProvider;
use crate::services::{AuthService, GuideService, ServiceError};

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub auth: AuthService,
    pub guides: GuideService,
    /// Signs the short-lived OAuth state and return-to cookies
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, identity: Option<Arc<dyn IdentityProvider>>) -> Self {
        let auth = AuthService::new(
            identity,
            UserStore::new(db.clone()),
            SessionStore::new(db.clone()),
            config.auth.session_ttl(),
        );
        let guides = GuideService::new(GuideStore::new(db.clone()));
        let cookie_key = derive_cookie_key(&config.auth.cookie_secret);

        Self {
            config,
            db,
            auth,
            guides,
            cookie_key,
        }
    }

    /// Render a service failure for clients. Internal details only leave the
    /// process outside of production.
    pub fn error(&self, err: ServiceError) -> ApiError {
        ApiError::from_service(err, !self.config.server.is_production())
    }
}

/// Stretch an arbitrary-length secret into the 64 bytes a cookie key needs.
fn derive_cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(&digest[..])
}
