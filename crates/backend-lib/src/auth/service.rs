//! This module defines the `AuthService` trait, the operation contracts the
//! transport layer calls into.
use async_trait::async_trait;
use authd_common::{Credentials, Tokens, UserId};

use crate::error::AppError;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new credential. Fails with `EmailAlreadyExists` on a duplicate email.
    async fn sign_up(&self, credentials: Credentials) -> Result<(), AppError>;

    /// Exchange an email/password pair for a fresh token pair
    async fn sign_in(&self, credentials: Credentials) -> Result<Tokens, AppError>;

    /// Rotate a refresh token. Every token of the subject is revoked first.
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<Tokens, AppError>;

    /// Resolve the subject of a live, unrevoked access token
    async fn verify_access_token(&self, access_token: &str) -> Result<UserId, AppError>;

    /// Revoke exactly the presented access and refresh tokens
    async fn logout(&self, tokens: Tokens) -> Result<(), AppError>;
}
