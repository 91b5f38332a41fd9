//! Error taxonomy for the integrity and quarantine engine.
//!
//! Most failures never reach callers: unreadable state is treated as absent
//! and per-file move errors are folded into the run outcome. The variants
//! below are what remains visible, either as a returned `Err` or as the
//! message recorded on a [`MoveFailure`](crate::quarantine::MoveFailure).

use std::path::PathBuf;

use vigil_state::StateError;

/// Vigil engine errors.
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsafe path outside repository: {0}")]
    UnsafePath(String),

    #[error("move of {path} timed out after {timeout_ms} ms")]
    MoveTimeout { path: String, timeout_ms: u64 },

    #[error("orphan detector failed: {0}")]
    Detector(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VigilError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VigilError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for Vigil engine operations.
pub type Result<T> = std::result::Result<T, VigilError>;
