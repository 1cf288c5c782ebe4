//! Error handling for the admission core
//!
//! This module defines all error types used throughout the crate.

#![allow(missing_docs)]

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Policy constraint violated by an administrative mutation
    #[error("Configuration violation: {0}")]
    ConfigurationViolation(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Non-database storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Token plaintext failed the shape precondition
    #[error("Malformed token")]
    MalformedToken,

    /// No matching usable token
    #[error("Invalid or missing authentication token")]
    InvalidToken,

    /// Token matched but is past its expiry
    #[error("Token has expired")]
    ExpiredToken,

    /// API key did not match an enabled trusted client
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Email/password pair did not match
    #[error("Invalid authentication credentials")]
    InvalidCredentials,

    /// A protected operation was reached without a principal
    #[error("You must be authenticated to access this resource")]
    Unauthenticated,

    /// Principal exists but is not activated
    #[error("Your user account must be activated to access this resource")]
    InactiveAccount,

    /// Rate limiting errors
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Forbidden errors
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad request errors
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MalformedToken
            | GatewayError::InvalidToken
            | GatewayError::ExpiredToken
            | GatewayError::InvalidApiKey
            | GatewayError::InvalidCredentials
            | GatewayError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GatewayError::InactiveAccount | GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Validation(_) | GatewayError::ConfigurationViolation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            GatewayError::BadRequest(_) | GatewayError::Serialization(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message) = match self {
            GatewayError::MalformedToken | GatewayError::InvalidToken => {
                ("INVALID_TOKEN", self.to_string())
            }
            GatewayError::ExpiredToken => ("TOKEN_EXPIRED", self.to_string()),
            GatewayError::InvalidApiKey => ("INVALID_API_KEY", self.to_string()),
            GatewayError::InvalidCredentials => ("INVALID_CREDENTIALS", self.to_string()),
            GatewayError::Unauthenticated => ("AUTH_REQUIRED", self.to_string()),
            GatewayError::InactiveAccount => ("INACTIVE_ACCOUNT", self.to_string()),
            GatewayError::Forbidden(_) => ("NOT_PERMITTED", self.to_string()),
            GatewayError::RateLimit { .. } => ("RATE_LIMIT_EXCEEDED", self.to_string()),
            GatewayError::Validation(_) => ("VALIDATION_ERROR", self.to_string()),
            GatewayError::ConfigurationViolation(_) => {
                ("CONFIGURATION_VIOLATION", self.to_string())
            }
            GatewayError::BadRequest(_) | GatewayError::Serialization(_) => {
                ("BAD_REQUEST", self.to_string())
            }
            GatewayError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            GatewayError::Conflict(_) => ("EDIT_CONFLICT", self.to_string()),
            GatewayError::Timeout(_) => ("TIMEOUT", self.to_string()),
            GatewayError::Database(_) | GatewayError::Storage(_) => (
                "STORAGE_ERROR",
                "Storage operation failed".to_string(),
            ),
            _ => (
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: error_code.to_string(),
                message,
                timestamp: chrono::Utc::now().timestamp(),
            },
        };

        let mut builder = HttpResponse::build(self.status_code());
        if let GatewayError::RateLimit {
            retry_after_secs: Some(secs),
            ..
        } = self
        {
            builder.insert_header(("Retry-After", secs.to_string()));
        }
        if matches!(
            self,
            GatewayError::InvalidToken
                | GatewayError::MalformedToken
                | GatewayError::ExpiredToken
                | GatewayError::Unauthenticated
        ) {
            builder.insert_header(("WWW-Authenticate", "Bearer"));
        }
        builder.json(error_response)
    }
}

/// Standard error response format
#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: i64,
}

/// Helper functions for creating specific errors
impl GatewayError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn configuration_violation<S: Into<String>>(message: S) -> Self {
        Self::ConfigurationViolation(message.into())
    }

    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage(message.into())
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict(message.into())
    }

    pub fn edit_conflict() -> Self {
        Self::Conflict(
            "unable to update the record due to an edit conflict, please try again".to_string(),
        )
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn rate_limit<S: Into<String>>(message: S, retry_after_secs: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after_secs,
        }
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden(message.into())
    }

    /// Underlying store was unreachable or returned an error
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, GatewayError::Database(_) | GatewayError::Storage(_))
    }

    /// Presented token or key was malformed, unknown, or expired
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::MalformedToken
                | GatewayError::InvalidToken
                | GatewayError::ExpiredToken
                | GatewayError::InvalidApiKey
        )
    }
}
