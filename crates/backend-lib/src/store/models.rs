//! Persisted records.
use authd_common::{TokenType, UserId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// A record kept in a [`super::Table`]
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Table name used in error messages
    const KIND: &'static str;

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);

    /// Value that must be unique across the table, if any
    fn unique_key(&self) -> Option<&str> {
        None
    }

    /// Reject an update that would break a per-row invariant
    fn check_update(&self, _previous: &Self) -> Result<(), String> {
        Ok(())
    }
}

/// A registered principal
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
}

impl Credential {
    /// New credential with no id yet; the store assigns one on create
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: 0,
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Entity for Credential {
    const KIND: &'static str = "credential";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.email)
    }
}

/// One issued token, kept so it can be revoked and audited
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub id: i64,
    pub jti: String,
    pub subject_id: UserId,
    pub token_type: TokenType,
    /// Write-once to `true`
    pub revoked: bool,
}

impl Token {
    pub fn new(jti: impl Into<String>, subject_id: UserId, token_type: TokenType) -> Self {
        Self {
            id: 0,
            jti: jti.into(),
            subject_id,
            token_type,
            revoked: false,
        }
    }
}

impl Entity for Token {
    const KIND: &'static str = "token";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.jti)
    }

    fn check_update(&self, previous: &Self) -> Result<(), String> {
        if previous.revoked && !self.revoked {
            return Err(format!("token {} is revoked", self.jti));
        }
        if previous.subject_id != self.subject_id || previous.token_type != self.token_type {
            return Err(format!("token {} owner and type are immutable", self.jti));
        }
        Ok(())
    }
}
