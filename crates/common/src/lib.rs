// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between `authd` clients and the server.
//! This module defines the request/response envelopes of the five
//! credential operations and supporting types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a registered principal, assigned by the credential store
pub type UserId = i64;

/// Email/password pair supplied at sign-up and sign-in
#[derive(Serialize, Deserialize, Clone)]
pub struct Credentials {
    /// Login email (case-sensitive, unique)
    pub email: String,
    /// Plaintext password, only ever held in transit
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Access/refresh token pair returned by sign-in and refresh
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    /// Short-lived access token
    pub access: String,
    /// Longer-lived, single-use refresh token
    pub refresh: String,
}

/// Kind of a signed token; fixed when minted and checked on every verification
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Register a new principal
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignUpRequest {
    pub credentials: Credentials,
}

/// Exchange credentials for a token pair
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignInRequest {
    pub credentials: Credentials,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignInResponse {
    pub tokens: Tokens,
}

/// Rotate a refresh token into a fresh pair
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RefreshTokensRequest {
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RefreshTokensResponse {
    pub tokens: Tokens,
}

/// Check an access token and resolve its subject
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VerifyAccessTokenRequest {
    pub access: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerifyAccessTokenResponse {
    pub user_id: UserId,
}

/// Revoke exactly the presented access and refresh tokens
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LogoutRequest {
    pub tokens: Tokens,
}

/// Error envelope returned by the HTTP adapter
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
