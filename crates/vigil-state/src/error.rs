//! Error types for vigil-state

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the state persistence layer
#[derive(Error, Debug)]
pub enum StateError {
    /// No document stored at the requested path
    #[error("Document not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Underlying filesystem error
    #[error("I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Stored document could not be decoded into the requested type
    #[error("Deserialization of {} failed: {reason}", path.display())]
    Deserialization { path: PathBuf, reason: String },
}

impl StateError {
    /// True when the error means "nothing stored yet" rather than a broken backend.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StateError::NotFound { .. })
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_includes_path() {
        let err = StateError::NotFound {
            path: PathBuf::from(".vigil/pending.json"),
        };
        assert!(err.to_string().contains(".vigil/pending.json"));
        assert!(err.is_not_found());
    }

    #[test]
    fn deserialization_is_not_not_found() {
        let err = StateError::Deserialization {
            path: PathBuf::from("x.json"),
            reason: "expected array".to_string(),
        };
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("expected array"));
    }
}
