//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryStateStore`, which satisfies the `StateStore` contract
//! without touching the filesystem, and can be snapshotted to assert that
//! a run left persisted state untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StateError;
use crate::storage_traits::{StateResult, StateStore};

/// In-memory document store backed by a `BTreeMap<path, bytes>`.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    docs: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    writes: Mutex<u64>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored document, keyed by path.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        self.docs.lock().unwrap().clone()
    }

    /// Number of completed writes since creation.
    pub fn write_count(&self) -> u64 {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn read(&self, path: &Path) -> StateResult<Vec<u8>> {
        let docs = self.docs.lock().unwrap();
        docs.get(path).cloned().ok_or_else(|| StateError::NotFound {
            path: path.to_path_buf(),
        })
    }

    async fn write(&self, path: &Path, data: &[u8]) -> StateResult<()> {
        self.docs
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), data.to_vec());
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }

    async fn exists(&self, path: &Path) -> StateResult<bool> {
        Ok(self.docs.lock().unwrap().contains_key(path))
    }
}
