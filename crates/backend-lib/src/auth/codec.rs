//! Signed token minting and verification.
//!
//! Tokens are HS256 JWTs carrying `{id, email, jti, exp, type}`. The signing
//! secret is handed in once at construction; nothing here reads the
//! environment. Every verification checks signature, expiry, and that the
//! `type` claim matches what the caller expects, so an access token is never
//! accepted where a refresh token is required and vice versa.
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use authd_common::{TokenType, UserId};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::token_generator::generate_jti;
use crate::config::{JwtSettings, Secret};
use crate::error::AppError;

/// Claim-set embedded in every token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Owning credential id
    pub id: UserId,
    pub email: String,
    pub jti: String,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

impl Claims {
    /// The token identifier linking this claim-set to its store record
    pub fn extract_jti(&self) -> Result<&str, AppError> {
        if self.jti.is_empty() {
            return Err(AppError::Internal("token claims carry no jti".to_string()));
        }
        Ok(&self.jti)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Malformed, badly signed, or expired
    #[error("invalid token")]
    Invalid,
    #[error("expected {expected} token, got {actual}")]
    WrongType {
        expected: TokenType,
        actual: TokenType,
    },
}

/// A freshly signed token plus the fields its store record needs
#[derive(Debug, Clone)]
pub struct MintedToken {
    pub jti: String,
    pub token: String,
    pub token_type: TokenType,
    pub expires_at: i64,
}

/// Access and refresh tokens minted together for one subject
#[derive(Debug, Clone)]
pub struct MintedPair {
    pub access: MintedToken,
    pub refresh: MintedToken,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &Secret, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding: EncodingKey::from_secret(secret.expose()),
            decoding: DecodingKey::from_secret(secret.expose()),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_settings(settings: &JwtSettings) -> Self {
        Self::new(&settings.secret, settings.access_ttl(), settings.refresh_ttl())
    }

    /// Configured lifetime for tokens of `token_type`
    pub fn ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }

    /// Sign a new token with a fresh `jti` expiring `ttl` from now
    pub fn mint(
        &self,
        subject_id: UserId,
        email: &str,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<MintedToken, AppError> {
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| AppError::Internal("token lifetime out of range".to_string()))?;
        let claims = Claims {
            id: subject_id,
            email: email.to_string(),
            jti: generate_jti(),
            exp: now_unix().saturating_add(ttl_secs),
            token_type,
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign {token_type} token: {e}")))?;
        Ok(MintedToken {
            jti: claims.jti,
            token,
            token_type,
            expires_at: claims.exp,
        })
    }

    /// Mint an access/refresh pair bound to one subject
    pub fn mint_pair(&self, subject_id: UserId, email: &str) -> Result<MintedPair, AppError> {
        let access = self.mint(subject_id, email, TokenType::Access, self.ttl(TokenType::Access))?;
        let refresh = self.mint(
            subject_id,
            email,
            TokenType::Refresh,
            self.ttl(TokenType::Refresh),
        )?;
        Ok(MintedPair { access, refresh })
    }

    /// Check signature, expiry, and type tag
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Invalid);
        }
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                debug!(error = %e, expected = %expected, "token rejected");
                TokenError::Invalid
            })?;
        let claims = data.claims;
        if claims.exp <= now_unix() {
            return Err(TokenError::Invalid);
        }
        if claims.token_type != expected {
            return Err(TokenError::WrongType {
                expected,
                actual: claims.token_type,
            });
        }
        Ok(claims)
    }
}

fn now_unix() -> i64 {
    // A clock before the epoch clamps to zero rather than panicking.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
