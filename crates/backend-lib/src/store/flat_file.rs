// ============================
// authd-backend-lib/src/store/flat_file.rs
// ============================
//! Flat-file store: the memory store plus a JSON snapshot on disk.
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::fs as tokio_fs;
use tracing::info;

use super::{
    memory::{MemoryStore, StoreState},
    Store, StoreError, StoreResult, Transaction,
};

const SNAPSHOT_FILE: &str = "store.json";

/// Location of the committed snapshot
#[derive(Debug)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            path: root.as_ref().join(SNAPSHOT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot, or an empty state when none was written yet
    pub async fn load(&self) -> StoreResult<StoreState> {
        if !tokio_fs::try_exists(&self.path)
            .await
            .context("checking snapshot")?
        {
            return Ok(StoreState::default());
        }
        let content = tokio_fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        let mut state: StoreState =
            serde_json::from_str(&content).context("decoding store snapshot")?;
        state.reindex()?;
        Ok(state)
    }

    /// Replace the snapshot atomically: write a sibling file, then rename over
    pub async fn write(&self, state: &StoreState) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(state).context("encoding store snapshot")?;
        let tmp = self.path.with_extension("json.tmp");
        tokio_fs::write(&tmp, json)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio_fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))
            .map_err(StoreError::from)
    }
}

/// Flat-file implementation of the Store trait
#[derive(Clone)]
pub struct FlatFileStore {
    inner: MemoryStore,
}

impl FlatFileStore {
    /// Open (or create) the store rooted at `root`
    pub async fn open<P: AsRef<Path>>(root: P) -> StoreResult<Self> {
        let root = root.as_ref();
        tokio_fs::create_dir_all(root)
            .await
            .with_context(|| format!("creating {}", root.display()))?;
        let snapshot = SnapshotFile::new(root);
        let state = snapshot.load().await?;
        info!(
            path = %snapshot.path().display(),
            credentials = state.credentials.len(),
            tokens = state.tokens.len(),
            "flat-file store opened"
        );
        Ok(Self {
            inner: MemoryStore::persistent(state, snapshot),
        })
    }

    /// Copy of the committed state
    pub async fn committed(&self) -> StoreState {
        self.inner.committed().await
    }
}

#[async_trait]
impl Store for FlatFileStore {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>> {
        self.inner.begin().await
    }

    fn backend_name(&self) -> &'static str {
        "flat_file"
    }
}
