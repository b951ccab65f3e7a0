//! Business logic between the HTTP handlers and the stores.

pub mod auth;
pub mod guides;

pub use auth::{AuthService, IssuedSession, SessionLookup};
pub use guides::{AccessPolicy, GuideService, RolePolicy};

use thiserror::Error;

use crate::oauth::ProviderError;

/// Failures surfaced to callers of the services.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("you do not have permission to modify this guide")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The provider answered but did not include an email address.
    #[error("identity provider did not return an email; ensure the 'email' scope is granted")]
    MissingEmailScope,

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ServiceError::NotFound,
            other => ServiceError::Database(other),
        }
    }
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidInput(message.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
