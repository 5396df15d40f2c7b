// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation module.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::config::PasswordSettings;
use crate::error::AppError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_TOKEN_LENGTH: usize = 4096;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex is valid")
});

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidArgument(err.to_string())
    }
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email must not be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Email must look like user@example.com".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a new password against the configured length bounds
pub fn validate_password<'a>(
    password: &'a str,
    policy: &PasswordSettings,
) -> ValidationResult<&'a str> {
    let length = password.chars().count();

    if length < policy.min_length {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at least {} characters",
            policy.min_length
        )));
    }

    if length > policy.max_length {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {} characters",
            policy.max_length
        )));
    }

    Ok(password)
}

/// Cheap shape check before a token reaches the codec
pub fn validate_token(token: &str) -> ValidationResult<&str> {
    if token.is_empty() {
        return Err(ValidationError::InvalidToken(
            "Token must not be empty".to_string(),
        ));
    }

    if token.len() > MAX_TOKEN_LENGTH {
        return Err(ValidationError::InvalidToken(format!(
            "Token cannot exceed {MAX_TOKEN_LENGTH} characters"
        )));
    }

    Ok(token)
}
