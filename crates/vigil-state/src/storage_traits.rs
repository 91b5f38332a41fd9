//! Storage trait definitions for Vigil
//!
//! `StateStore` is the generic read/write primitive every engine component
//! persists through. Documents are opaque bytes at this layer; the typed
//! helpers below encode them as pretty JSON.
//!
//! The trait is async and backend-agnostic. An in-memory fake is provided
//! for testing via the `fakes` module.

use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::StateError;

/// Result type for storage operations
pub type StateResult<T> = std::result::Result<T, StateError>;

/// Whole-document state storage.
///
/// Guarantees:
/// - `write(path, data)` replaces any previous document at `path` entirely.
/// - `read(path)` returns the exact bytes of the last completed write, or
///   `StateError::NotFound` if nothing was ever written.
/// - A reader never observes a partially written document.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the raw document stored at `path`.
    async fn read(&self, path: &Path) -> StateResult<Vec<u8>>;

    /// Replace the document stored at `path` with `data`.
    async fn write(&self, path: &Path, data: &[u8]) -> StateResult<()>;

    /// Check whether a document exists at `path`.
    async fn exists(&self, path: &Path) -> StateResult<bool>;
}

/// Read and decode a JSON document.
pub async fn read_json<T, S>(store: &S, path: &Path) -> StateResult<T>
where
    T: DeserializeOwned,
    S: StateStore + ?Sized,
{
    let bytes = store.read(path).await?;
    serde_json::from_slice(&bytes).map_err(|e| StateError::Deserialization {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Encode `value` as pretty JSON and write it as one document.
pub async fn write_json<T, S>(store: &S, path: &Path, value: &T) -> StateResult<()>
where
    T: Serialize + ?Sized,
    S: StateStore + ?Sized,
{
    let bytes = serde_json::to_vec_pretty(value)?;
    store.write(path, &bytes).await
}

/// Write a plain text document (rendered reports).
pub async fn write_text<S>(store: &S, path: &Path, text: &str) -> StateResult<()>
where
    S: StateStore + ?Sized,
{
    store.write(path, text.as_bytes()).await
}

/// Read a JSON document, treating any failure as "absent".
///
/// Missing documents are expected on a first run and logged at `debug`;
/// unreadable or malformed ones are logged at `info`. Neither is returned
/// to the caller.
pub async fn read_or_default<T, S>(store: &S, path: &Path) -> T
where
    T: DeserializeOwned + Default,
    S: StateStore + ?Sized,
{
    match read_json(store, path).await {
        Ok(value) => value,
        Err(e) if e.is_not_found() => {
            debug!(path = %path.display(), "no persisted document, using empty default");
            T::default()
        }
        Err(e) => {
            info!(path = %path.display(), error = %e, "unreadable persisted document, using empty default");
            T::default()
        }
    }
}
