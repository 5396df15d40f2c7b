// ============================
// authd-backend-lib/src/store/mod.rs
// ============================
//! Storage abstraction for credential and token records.
//!
//! All access goes through a [`Transaction`] opened with [`Store::begin`].
//! A transaction that is dropped without a successful [`Transaction::commit`]
//! is discarded, so an early return or a cancelled request never leaves
//! partial writes visible to other callers.
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

pub mod flat_file;
pub mod memory;
pub mod models;
mod table;

pub use flat_file::FlatFileStore;
pub use memory::MemoryStore;
pub use models::{Credential, Entity, Token};
pub use table::Table;

use authd_common::UserId;

use crate::config::{StorageBackend, StorageSettings};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD shared by every entity type
#[async_trait]
pub trait Repository<T: Entity>: Send {
    async fn get_by_id(&mut self, id: i64) -> StoreResult<Option<T>>;
    /// Insert `entity`, returning it with its store-assigned id
    async fn create(&mut self, entity: T) -> StoreResult<T>;
    async fn update(&mut self, entity: T) -> StoreResult<()>;
    async fn delete(&mut self, id: i64) -> StoreResult<()>;
    async fn count_by_id(&mut self, id: i64) -> StoreResult<u64>;
}

/// Credential-specific lookups
#[async_trait]
pub trait CredentialsRepository: Repository<Credential> {
    async fn count_by_email(&mut self, email: &str) -> StoreResult<u64>;
    async fn get_by_email(&mut self, email: &str) -> StoreResult<Option<Credential>>;
}

/// Token-specific lookups and revocation
#[async_trait]
pub trait TokensRepository: Repository<Token> {
    async fn get_by_jti(&mut self, jti: &str) -> StoreResult<Option<Token>>;
    /// Mark one token revoked. Unknown ids are a no-op.
    async fn revoke_by_jti(&mut self, jti: &str) -> StoreResult<()>;
    /// Mark every token owned by `subject_id` revoked, returning how many rows changed
    async fn revoke_all_by_subject(&mut self, subject_id: UserId) -> StoreResult<u64>;
}

/// One unit of work against both repositories
#[async_trait]
pub trait Transaction: Send {
    fn credentials(&mut self) -> &mut dyn CredentialsRepository;
    fn tokens(&mut self) -> &mut dyn TokensRepository;
    /// Publish every write made through this transaction atomically
    async fn commit(self: Box<Self>) -> StoreResult<()>;
    /// Discard every write. Dropping the transaction has the same effect.
    async fn rollback(self: Box<Self>);
}

/// Trait for storage backends
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>>;
    fn backend_name(&self) -> &'static str;
}

/// Open the backend selected in `settings`
pub async fn open_store(settings: &StorageSettings) -> StoreResult<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match settings.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::FlatFile => Arc::new(FlatFileStore::open(&settings.path).await?),
    };
    info!(backend = store.backend_name(), "store ready");
    Ok(store)
}
