//! Credential and token lifecycle manager.
//!
//! Each operation's writes happen inside one store transaction. Success paths
//! end in an explicit commit; every other exit drops the transaction, which
//! discards its writes. Password hashing never runs while a transaction is
//! open, since a transaction holds the store lock. No state is kept between
//! calls.
use std::sync::Arc;

use async_trait::async_trait;
use authd_common::{Credentials, TokenType, Tokens, UserId};
use metrics::counter;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use super::codec::{MintedPair, TokenCodec, TokenError};
use super::notifier::{EmailNotification, Notifier};
use super::password::PasswordHasher;
use super::service::AuthService;
use crate::config::{PasswordSettings, Settings};
use crate::error::AppError;
use crate::metrics as keys;
use crate::store::{Credential, Store, StoreError, Token, Transaction};
use crate::validation;

pub struct DefaultAuth {
    store: Arc<dyn Store>,
    codec: TokenCodec,
    hasher: PasswordHasher,
    password_policy: PasswordSettings,
    notifier: Option<Arc<dyn Notifier>>,
    /// Hash checked against when the email is unknown, so both sign-in
    /// failures cost the same
    decoy_hash: Arc<OnceCell<String>>,
}

impl DefaultAuth {
    pub fn new(store: Arc<dyn Store>, codec: TokenCodec, hasher: PasswordHasher) -> Self {
        Self {
            store,
            codec,
            hasher,
            password_policy: PasswordSettings::default(),
            notifier: None,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Build from validated settings
    pub fn from_settings(settings: &Settings, store: Arc<dyn Store>) -> Result<Self, AppError> {
        let codec = TokenCodec::from_settings(&settings.jwt);
        let hasher = PasswordHasher::from_settings(&settings.password)?;
        Ok(Self::new(store, codec, hasher).with_password_policy(settings.password.clone()))
    }

    pub fn with_password_policy(mut self, policy: PasswordSettings) -> Self {
        self.password_policy = policy;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Stored credential for `email`. Carries the password hash, never the password.
    pub async fn credentials_by_email(&self, email: &str) -> Result<Option<Credential>, AppError> {
        let mut tx = self.store.begin().await?;
        let credential = tx.credentials().get_by_email(email).await?;
        tx.rollback().await;
        Ok(credential)
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || {
            let mut password = password;
            hasher.hash_secure(&mut password)
        })
        .await?
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AppError> {
        let hasher = self.hasher.clone();
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await?)
    }

    async fn decoy_hash(&self) -> Result<String, AppError> {
        self.decoy_hash
            .get_or_try_init(|| self.hash_password("decoy-password".to_string()))
            .await
            .cloned()
    }

    /// Persist both records of a freshly minted pair
    async fn store_pair(
        tx: &mut dyn Transaction,
        subject_id: UserId,
        pair: &MintedPair,
    ) -> Result<(), AppError> {
        for minted in [&pair.access, &pair.refresh] {
            tx.tokens()
                .create(Token::new(minted.jti.clone(), subject_id, minted.token_type))
                .await?;
        }
        Ok(())
    }

    fn notify_async(&self, notification: EmailNotification) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(notification).await {
                counter!(keys::NOTIFICATION_FAILURES).increment(1);
                warn!(error = %e, "failed to deliver notification");
            }
        });
    }
}

fn into_tokens(pair: MintedPair) -> Tokens {
    Tokens {
        access: pair.access.token,
        refresh: pair.refresh.token,
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn sign_up(&self, credentials: Credentials) -> Result<(), AppError> {
        let Credentials { email, password } = credentials;
        validation::validate_email(&email)?;
        validation::validate_password(&password, &self.password_policy)?;

        if self.credentials_by_email(&email).await?.is_some() {
            debug!("sign-up rejected, email already registered");
            return Err(AppError::EmailAlreadyExists);
        }
        let password_hash = self.hash_password(password).await?;

        // Re-checked under the lock; another sign-up may have won meanwhile.
        let mut tx = self.store.begin().await?;
        if tx.credentials().count_by_email(&email).await? > 0 {
            debug!("sign-up rejected, email registered concurrently");
            return Err(AppError::EmailAlreadyExists);
        }
        let created = tx
            .credentials()
            .create(Credential::new(email.clone(), password_hash))
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AppError::EmailAlreadyExists,
                other => AppError::from(other),
            })?;
        tx.commit().await?;

        counter!(keys::CREDENTIALS_CREATED).increment(1);
        info!(subject_id = created.id, "credential registered");
        self.notify_async(EmailNotification::welcome(&email));
        Ok(())
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<Tokens, AppError> {
        let Credentials { email, password } = credentials;

        let Some(credential) = self.credentials_by_email(&email).await? else {
            // Burn the same hashing work as a real check before failing.
            let decoy = self.decoy_hash().await?;
            let _ = self.verify_password(password, decoy).await?;
            debug!("sign-in rejected, unknown email");
            return Err(AppError::CredentialsNotFound);
        };

        if !self
            .verify_password(password, credential.password_hash.clone())
            .await?
        {
            debug!(subject_id = credential.id, "sign-in rejected, wrong password");
            return Err(AppError::InvalidPassword);
        }

        let pair = self.codec.mint_pair(credential.id, &credential.email)?;

        let mut tx = self.store.begin().await?;
        if tx.credentials().count_by_id(credential.id).await? == 0 {
            debug!(subject_id = credential.id, "credential removed during sign-in");
            return Err(AppError::CredentialsNotFound);
        }
        Self::store_pair(&mut *tx, credential.id, &pair).await?;
        tx.commit().await?;

        counter!(keys::TOKENS_ISSUED).increment(2);
        info!(subject_id = credential.id, "signed in");
        Ok(into_tokens(pair))
    }

    async fn refresh_tokens(&self, refresh_token: &str) -> Result<Tokens, AppError> {
        validation::validate_token(refresh_token).map_err(|_| AppError::InvalidRefreshToken)?;
        let claims = self
            .codec
            .verify(refresh_token, TokenType::Refresh)
            .map_err(|e| {
                debug!(error = %e, "refresh rejected by codec");
                AppError::InvalidRefreshToken
            })?;
        let jti = claims.extract_jti()?;

        let mut tx = self.store.begin().await?;
        let Some(record) = tx.tokens().get_by_jti(jti).await? else {
            debug!("refresh rejected, unknown jti");
            return Err(AppError::InvalidRefreshToken);
        };
        if record.token_type != TokenType::Refresh || record.subject_id != claims.id {
            warn!(subject_id = record.subject_id, "refresh token does not match its record");
            return Err(AppError::InvalidRefreshToken);
        }
        if record.revoked {
            counter!(keys::REFRESH_REUSE).increment(1);
            warn!(subject_id = record.subject_id, "revoked refresh token presented again");
            return Err(AppError::RevokedRefreshToken);
        }

        // Rotation invalidates the whole family, not just the presented token.
        let revoked = tx.tokens().revoke_all_by_subject(record.subject_id).await?;

        let Some(credential) = tx.credentials().get_by_id(record.subject_id).await? else {
            error!(
                subject_id = record.subject_id,
                "live refresh token references a missing credential"
            );
            return Err(AppError::Internal(
                "token subject no longer exists".to_string(),
            ));
        };

        let pair = self.codec.mint_pair(credential.id, &credential.email)?;
        Self::store_pair(&mut *tx, credential.id, &pair).await?;
        tx.commit().await?;

        counter!(keys::TOKENS_REVOKED).increment(revoked);
        counter!(keys::TOKENS_ISSUED).increment(2);
        info!(subject_id = credential.id, revoked, "tokens rotated");
        Ok(into_tokens(pair))
    }

    async fn verify_access_token(&self, access_token: &str) -> Result<UserId, AppError> {
        validation::validate_token(access_token).map_err(|_| AppError::InvalidAccessToken)?;
        let claims = self
            .codec
            .verify(access_token, TokenType::Access)
            .map_err(|e: TokenError| {
                debug!(error = %e, "access token rejected by codec");
                AppError::InvalidAccessToken
            })?;
        let jti = claims
            .extract_jti()
            .map_err(|_| AppError::InvalidAccessToken)?;

        let mut tx = self.store.begin().await?;
        let record = tx.tokens().get_by_jti(jti).await?;
        tx.rollback().await;

        match record {
            Some(token) if token.token_type == TokenType::Access && !token.revoked => {
                Ok(token.subject_id)
            },
            Some(token) => {
                debug!(subject_id = token.subject_id, revoked = token.revoked, "access token not usable");
                Err(AppError::InvalidAccessToken)
            },
            None => {
                debug!("access token has no record");
                Err(AppError::InvalidAccessToken)
            },
        }
    }

    async fn logout(&self, tokens: Tokens) -> Result<(), AppError> {
        validation::validate_token(&tokens.access)?;
        validation::validate_token(&tokens.refresh)?;
        let access = self
            .codec
            .verify(&tokens.access, TokenType::Access)
            .map_err(|e| AppError::InvalidArgument(format!("access token: {e}")))?;
        let refresh = self
            .codec
            .verify(&tokens.refresh, TokenType::Refresh)
            .map_err(|e| AppError::InvalidArgument(format!("refresh token: {e}")))?;
        if access.id != refresh.id {
            return Err(AppError::InvalidArgument(
                "tokens belong to different subjects".to_string(),
            ));
        }

        let access_jti = access.extract_jti()?;
        let refresh_jti = refresh.extract_jti()?;

        let mut tx = self.store.begin().await?;
        tx.tokens().revoke_by_jti(access_jti).await?;
        tx.tokens().revoke_by_jti(refresh_jti).await?;
        tx.commit().await?;

        counter!(keys::TOKENS_REVOKED).increment(2);
        info!(subject_id = access.id, "logged out");
        Ok(())
    }
}
