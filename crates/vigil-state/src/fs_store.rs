use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use crate::error::StateError;
use crate::storage_traits::{StateResult, StateStore};

/// Filesystem-backed document store.
///
/// Relative paths resolve against `root`; absolute paths are used as-is.
/// Writes go to a temp file in the destination directory and are renamed
/// into place, so a document is always either the old or the new version.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `root`. Nothing is created until the first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StateError + '_ {
    move |source| StateError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> StateResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(io_err(&dir))?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err(&dir))?;
    tmp.write_all(data).map_err(io_err(path))?;
    tmp.as_file().sync_all().map_err(io_err(path))?;
    tmp.persist(path).map_err(|e| StateError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn read(&self, path: &Path) -> StateResult<Vec<u8>> {
        let full = self.resolve(path);
        tokio::fs::read(&full).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StateError::NotFound { path: full.clone() }
            } else {
                StateError::Io {
                    path: full.clone(),
                    source: e,
                }
            }
        })
    }

    async fn write(&self, path: &Path, data: &[u8]) -> StateResult<()> {
        let full = self.resolve(path);
        let data = data.to_vec();
        let target = full.clone();
        tokio::task::spawn_blocking(move || write_atomic(&target, &data))
            .await
            .map_err(|e| StateError::Io {
                path: full,
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?
    }

    async fn exists(&self, path: &Path) -> StateResult<bool> {
        let full = self.resolve(path);
        tokio::fs::try_exists(&full).await.map_err(io_err(&full))
    }
}
