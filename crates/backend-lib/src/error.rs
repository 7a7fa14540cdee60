// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::validation::{ValidationError, ValidationErrors};

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Authentication rate limit exceeded")]
    AuthRateLimited,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimitExceeded | AppError::AuthRateLimited => {
                StatusCode::TOO_MANY_REQUESTS
            },
            AppError::Database(_) | AppError::Token(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Authentication(_) => "AUTHENTICATION_FAILED",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::RateLimitExceeded => "RATE_LIMITED",
            AppError::AuthRateLimited => "AUTH_RATE_LIMITED",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Token(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::BadRequest(_) => "Malformed request".to_string(),
            AppError::Validation(_) => "Request validation failed".to_string(),
            AppError::Authentication(_) => "Authentication failed".to_string(),
            AppError::PermissionDenied(_) => "Permission denied".to_string(),
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::Conflict(_) => "Resource conflict".to_string(),
            AppError::RateLimitExceeded => {
                "Rate limit exceeded, please try again later".to_string()
            },
            AppError::AuthRateLimited => {
                "Too many authentication attempts, please try again later".to_string()
            },
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Token(_) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            },
        }
    }

    /// Human readable detail: the full message for client errors, and for
    /// server errors only in debug builds
    pub fn detail(&self) -> String {
        if self.status_code().is_server_error() && !cfg!(debug_assertions) {
            self.sanitized_message()
        } else {
            match self {
                AppError::BadRequest(m)
                | AppError::Authentication(m)
                | AppError::PermissionDenied(m)
                | AppError::NotFound(m)
                | AppError::Conflict(m) => m.clone(),
                _ => self.to_string(),
            }
        }
    }

    /// Shorthand for a single field validation failure
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation(ValidationErrors::single(ValidationError::Invalid {
            field,
            message: message.into(),
        }))
    }

    /// RFC 7807 problem details body
    pub fn problem(&self) -> Value {
        let status = self.status_code();
        let mut body = json!({
            "type": "about:blank",
            "title": status.canonical_reason().unwrap_or("Error"),
            "status": status.as_u16(),
            "detail": self.detail(),
            "code": self.error_code(),
        });

        if let AppError::Validation(errors) = self {
            let mut fields = Map::new();
            for err in errors.iter() {
                // First message per field wins
                fields
                    .entry(err.field().to_string())
                    .or_insert_with(|| Value::String(err.to_string()));
            }
            body["errors"] = Value::Object(fields);
        }

        body
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }

        let body = self.problem();
        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            body.to_string(),
        )
            .into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(ValidationErrors::single(err))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errs: ValidationErrors) -> Self {
        AppError::Validation(errs)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Background task failed: {err}"))
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}
