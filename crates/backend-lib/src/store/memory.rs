//! In-memory implementation of the credential/token store.
//!
//! Both tables live behind one `tokio::sync::Mutex`. [`Store::begin`] takes
//! the lock and holds it until the transaction ends. Writes go straight to
//! the tables and are journaled; commit releases the journal, drop replays
//! it backwards. Read-only transactions therefore cost a lock and a lookup.
//!
//! Holding the lock for the whole unit of work serializes transactions. Two
//! requests presenting the same refresh token therefore run one after the
//! other and the second observes the revocation made by the first.
//!
//! Not durable on its own; [`super::FlatFileStore`] adds a snapshot file.
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::{
    flat_file::SnapshotFile,
    models::{Credential, Token},
    CredentialsRepository, Store, StoreResult, Table, TokensRepository, Transaction,
};

/// Full contents of the store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    pub credentials: Table<Credential>,
    pub tokens: Table<Token>,
}

impl StoreState {
    pub(crate) fn reindex(&mut self) -> StoreResult<()> {
        self.credentials.reindex()?;
        self.tokens.reindex()
    }

    fn begin(&mut self) {
        self.credentials.begin();
        self.tokens.begin();
    }

    fn release(&mut self) {
        self.credentials.release();
        self.tokens.release();
    }

    fn undo(&mut self) {
        self.credentials.undo();
        self.tokens.undo();
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
    snapshot: Option<Arc<SnapshotFile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose commits are written to `snapshot` before being published
    pub(crate) fn persistent(state: StoreState, snapshot: SnapshotFile) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            snapshot: Some(Arc::new(snapshot)),
        }
    }

    /// Copy of the committed state; waits for any open transaction to finish
    pub async fn committed(&self) -> StoreState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>> {
        let mut guard = Arc::clone(&self.state).lock_owned().await;
        guard.begin();
        Ok(Box::new(MemoryTransaction {
            guard,
            snapshot: self.snapshot.clone(),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Open unit of work; owns the store lock until committed or dropped
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<StoreState>,
    snapshot: Option<Arc<SnapshotFile>>,
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        // Runs before the guard is released; a no-op after commit.
        self.guard.undo();
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    fn credentials(&mut self) -> &mut dyn CredentialsRepository {
        &mut self.guard.credentials
    }

    fn tokens(&mut self) -> &mut dyn TokensRepository {
        &mut self.guard.tokens
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut tx = self;
        // Disk first: a failed write drops the transaction, which undoes it.
        if let Some(snapshot) = &tx.snapshot {
            snapshot.write(&tx.guard).await?;
        }
        tx.guard.release();
        Ok(())
    }

    async fn rollback(self: Box<Self>) {
        debug!("transaction discarded");
    }
}
