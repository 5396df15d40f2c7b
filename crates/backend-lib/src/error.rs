// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::store::StoreError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Credentials not found")]
    CredentialsNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Refresh token revoked")]
    RevokedRefreshToken,

    #[error("Invalid access token")]
    InvalidAccessToken,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::CredentialsNotFound
            | AppError::InvalidPassword
            | AppError::InvalidRefreshToken
            | AppError::RevokedRefreshToken
            | AppError::InvalidAccessToken => StatusCode::UNAUTHORIZED,
            AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            // Unknown email and wrong password share a code so callers cannot
            // enumerate registered accounts.
            AppError::CredentialsNotFound | AppError::InvalidPassword => "AUTH_001",
            AppError::InvalidAccessToken => "AUTH_002",
            AppError::InvalidRefreshToken => "AUTH_003",
            AppError::RevokedRefreshToken => "AUTH_004",
            AppError::EmailAlreadyExists => "CRED_001",
            AppError::InvalidArgument(_) => "VAL_001",
            AppError::Internal(_) => "INT_001",
            AppError::Storage(_) => "STORE_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::CredentialsNotFound | AppError::InvalidPassword => {
                "Authentication failed".to_string()
            },
            AppError::InvalidAccessToken => "Invalid access token".to_string(),
            AppError::InvalidRefreshToken => "Invalid refresh token".to_string(),
            AppError::RevokedRefreshToken => "Refresh token revoked".to_string(),
            AppError::EmailAlreadyExists => "Email already exists".to_string(),
            AppError::InvalidArgument(_) => "Invalid input provided".to_string(),
            AppError::Internal(_) | AppError::Storage(_) => "Internal server error".to_string(),
        }
    }

    /// Whether the error is an operator-facing failure rather than a caller mistake
    pub fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production.
        // Authentication failures stay sanitized in every build.
        let message = if cfg!(debug_assertions) && status != StatusCode::UNAUTHORIZED {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("background task failed: {err}"))
    }
}
