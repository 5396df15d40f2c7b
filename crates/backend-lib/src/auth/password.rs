// ============================
// authd-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use rand::rngs::OsRng;
use scrypt::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Params, Scrypt,
};
use zeroize::Zeroize;

use crate::config::PasswordSettings;
use crate::error::AppError;

/// scrypt `r` block size
const BLOCK_SIZE: u32 = 8;
/// scrypt parallelism
const PARALLELISM: u32 = 1;

/// Salted, cost-parameterized one-way hashing of account passwords
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Hasher with the given scrypt `log_n` work factor
    pub fn new(log_n: u8) -> Result<Self, AppError> {
        let params = Params::new(log_n, BLOCK_SIZE, PARALLELISM, Params::RECOMMENDED_LEN)
            .map_err(|e| AppError::Internal(format!("invalid scrypt parameters: {e}")))?;
        Ok(Self { params })
    }

    pub fn from_settings(settings: &PasswordSettings) -> Result<Self, AppError> {
        Self::new(settings.hash_cost)
    }

    /// Hash a password into a PHC string carrying its salt and parameters
    pub fn hash(&self, plain: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Scrypt
            .hash_password_customized(plain.as_bytes(), None, None, self.params, &salt)
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?
            .to_string();
        Ok(hash)
    }

    /// Hash a password and zeroize the original
    pub fn hash_secure(&self, plain: &mut String) -> Result<String, AppError> {
        let hash = self.hash(plain);
        plain.zeroize();
        hash
    }

    /// Verify a password against a stored hash.
    ///
    /// Uses the parameters recorded in the hash, so hashes written under an
    /// older cost keep verifying. Malformed hashes verify as `false`.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
    }
}
