//! Unified API error handling.
//!
//! All errors are returned as `{"error": {"code": "...", "message": "..."}}`
//! with an HTTP status derived from the code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::oauth::ProviderError;
use crate::services::ServiceError;

/// Error codes for API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Client errors (4xx)
    BadRequest,
    InvalidInput,
    Unauthorized,
    Forbidden,
    NotFound,
    OauthFailed,
    MissingEmailScope,

    // Server errors (5xx)
    NotConfigured,
    DatabaseError,
}

impl ErrorCode {
    /// Get the default HTTP status code for this error code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            // The user can simply retry the login
            ErrorCode::OauthFailed => StatusCode::BAD_REQUEST,
            ErrorCode::MissingEmailScope => StatusCode::BAD_REQUEST,
            ErrorCode::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::NotFound => "not_found",
            ErrorCode::OauthFailed => "oauth_failed",
            ErrorCode::MissingEmailScope => "missing_email_scope",
            ErrorCode::NotConfigured => "not_configured",
            ErrorCode::DatabaseError => "database_error",
        }
    }
}

/// The inner error object in the response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// The full error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Create a new API error with a specific code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.status_code(),
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Bad request error (400)
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Unauthorized error (401) - authentication required
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Not found error (404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Map a service failure onto the HTTP taxonomy. With `expose_internal`
    /// unset, storage errors carry a generic message.
    pub fn from_service(err: ServiceError, expose_internal: bool) -> Self {
        match err {
            ServiceError::Unauthenticated => Self::unauthorized("Authentication required"),
            ServiceError::Forbidden => Self::new(ErrorCode::Forbidden, err.to_string()),
            ServiceError::NotFound => Self::not_found("Guide not found"),
            ServiceError::InvalidInput(message) => Self::new(ErrorCode::InvalidInput, message),
            ServiceError::Provider(provider_err) => {
                warn!(error = %provider_err, "Identity provider request failed");
                let message = match provider_err {
                    ProviderError::ExchangeFailed(_) => "Token exchange failed",
                    ProviderError::ProfileFetchFailed(_) => "Failed to fetch user profile",
                };
                Self::new(ErrorCode::OauthFailed, message)
            }
            ServiceError::MissingEmailScope => Self::new(ErrorCode::MissingEmailScope, err.to_string()),
            ServiceError::NotConfigured(_) => {
                error!(error = %err, "Missing dependency");
                Self::new(ErrorCode::NotConfigured, err.to_string())
            }
            ServiceError::Database(db_err) => {
                error!("Database error: {}", db_err);
                let message = if expose_internal {
                    format!("Database error: {}", db_err)
                } else {
                    "A database error occurred".to_string()
                };
                Self::new(ErrorCode::DatabaseError, message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let response = ErrorResponse {
            error: ErrorBody {
                code: self.code.as_str().to_string(),
                message: self.message,
            },
        };

        (self.status, Json(response)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}
