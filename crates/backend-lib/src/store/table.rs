//! Generic in-memory table backing the memory and flat-file stores.
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use authd_common::UserId;
use serde::{Deserialize, Serialize};

use super::{
    models::{Credential, Entity, Token},
    CredentialsRepository, Repository, StoreError, StoreResult, TokensRepository,
};

/// Row state before one write, replayed in reverse to undo a transaction
#[derive(Debug, Clone)]
struct Undo<T> {
    id: i64,
    before: Option<T>,
    next_id: i64,
}

/// Rows keyed by id, plus a unique index over [`Entity::unique_key`].
///
/// Between [`Table::begin`] and [`Table::release`] every write records the
/// row it replaces, so [`Table::undo`] can put the table back exactly as it
/// was without the transaction ever copying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "T: Entity")]
pub struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
    #[serde(skip)]
    unique: HashMap<String, i64>,
    #[serde(skip)]
    journal: Option<Vec<Undo<T>>>,
}

impl<T: Entity> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
            unique: HashMap::new(),
            journal: None,
        }
    }
}

impl<T: Entity> Table<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    /// Rebuild the unique index after deserializing
    pub fn reindex(&mut self) -> StoreResult<()> {
        self.unique.clear();
        for row in self.rows.values() {
            if let Some(key) = row.unique_key() {
                if self.unique.insert(key.to_string(), row.id()).is_some() {
                    return Err(StoreError::Conflict(format!(
                        "duplicate {} key in snapshot",
                        T::KIND
                    )));
                }
            }
        }
        if let Some(max) = self.rows.keys().next_back() {
            self.next_id = self.next_id.max(max + 1);
        }
        Ok(())
    }

    /// Start recording writes
    pub(crate) fn begin(&mut self) {
        self.journal = Some(Vec::new());
    }

    /// Keep every write made since [`Table::begin`]
    pub(crate) fn release(&mut self) {
        self.journal = None;
    }

    /// Revert every write made since [`Table::begin`]. No-op when released.
    pub(crate) fn undo(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for entry in journal.into_iter().rev() {
            if let Some(current) = self.rows.remove(&entry.id) {
                if let Some(key) = current.unique_key() {
                    self.unique.remove(key);
                }
            }
            if let Some(before) = entry.before {
                if let Some(key) = before.unique_key() {
                    self.unique.insert(key.to_string(), entry.id);
                }
                self.rows.insert(entry.id, before);
            }
            self.next_id = entry.next_id;
        }
    }

    fn record(&mut self, id: i64) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(Undo {
                id,
                before: self.rows.get(&id).cloned(),
                next_id: self.next_id,
            });
        }
    }

    fn find_unique(&self, key: &str) -> Option<&T> {
        self.unique.get(key).and_then(|id| self.rows.get(id))
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for Table<T> {
    async fn get_by_id(&mut self, id: i64) -> StoreResult<Option<T>> {
        Ok(self.rows.get(&id).cloned())
    }

    async fn create(&mut self, mut entity: T) -> StoreResult<T> {
        if let Some(key) = entity.unique_key() {
            if self.unique.contains_key(key) {
                return Err(StoreError::Conflict(format!("{} already exists", T::KIND)));
            }
        }
        let id = self.next_id;
        self.record(id);
        self.next_id += 1;
        entity.set_id(id);
        if let Some(key) = entity.unique_key() {
            self.unique.insert(key.to_string(), id);
        }
        self.rows.insert(id, entity.clone());
        Ok(entity)
    }

    async fn update(&mut self, entity: T) -> StoreResult<()> {
        let id = entity.id();
        let Some(previous) = self.rows.get(&id) else {
            return Err(StoreError::NotFound(format!("{} {id}", T::KIND)));
        };
        if previous.unique_key() != entity.unique_key() {
            return Err(StoreError::Conflict(format!(
                "{} unique key is immutable",
                T::KIND
            )));
        }
        entity.check_update(previous).map_err(StoreError::Conflict)?;
        self.record(id);
        self.rows.insert(id, entity);
        Ok(())
    }

    async fn delete(&mut self, id: i64) -> StoreResult<()> {
        if !self.rows.contains_key(&id) {
            return Err(StoreError::NotFound(format!("{} {id}", T::KIND)));
        }
        self.record(id);
        if let Some(removed) = self.rows.remove(&id) {
            if let Some(key) = removed.unique_key() {
                self.unique.remove(key);
            }
        }
        Ok(())
    }

    async fn count_by_id(&mut self, id: i64) -> StoreResult<u64> {
        Ok(u64::from(self.rows.contains_key(&id)))
    }
}

#[async_trait]
impl CredentialsRepository for Table<Credential> {
    async fn count_by_email(&mut self, email: &str) -> StoreResult<u64> {
        Ok(u64::from(self.unique.contains_key(email)))
    }

    async fn get_by_email(&mut self, email: &str) -> StoreResult<Option<Credential>> {
        Ok(self.find_unique(email).cloned())
    }
}

#[async_trait]
impl TokensRepository for Table<Token> {
    async fn get_by_jti(&mut self, jti: &str) -> StoreResult<Option<Token>> {
        Ok(self.find_unique(jti).cloned())
    }

    async fn revoke_by_jti(&mut self, jti: &str) -> StoreResult<()> {
        let Some(&id) = self.unique.get(jti) else {
            return Ok(());
        };
        self.record(id);
        if let Some(token) = self.rows.get_mut(&id) {
            token.revoked = true;
        }
        Ok(())
    }

    async fn revoke_all_by_subject(&mut self, subject_id: UserId) -> StoreResult<u64> {
        let live: Vec<i64> = self
            .rows
            .values()
            .filter(|t| t.subject_id == subject_id && !t.revoked)
            .map(|t| t.id)
            .collect();
        for id in &live {
            self.record(*id);
            if let Some(token) = self.rows.get_mut(id) {
                token.revoked = true;
            }
        }
        Ok(live.len() as u64)
    }
}
