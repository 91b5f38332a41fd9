//! Orphan detection seam.
//!
//! Deciding which files are orphaned is outside this engine. The scheduler
//! only consumes an [`OrphanDetector`]; two thin adapters are provided, one
//! over a fixed list and one over a candidates document.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vigil_state::{read_json, StateStore};

use super::model::PruneReason;
use crate::entry::normalize_rel_path;
use crate::error::{Result, VigilError};

/// One file reported by the orphan detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanCandidate {
    #[serde(rename = "arquivo")]
    pub path: String,
    /// `Some(true)` when something still references the file.
    #[serde(
        rename = "referenciado",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub referenced: Option<bool>,
}

impl OrphanCandidate {
    pub fn orphan(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            referenced: None,
        }
    }

    pub fn referenced(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            referenced: Some(true),
        }
    }

    /// Referenced files are inactive; everything else is an orphan.
    pub fn reason(&self) -> PruneReason {
        if self.referenced == Some(true) {
            PruneReason::Inactive
        } else {
            PruneReason::Orphan
        }
    }
}

/// Source of this run's quarantine candidates.
#[async_trait]
pub trait OrphanDetector: Send + Sync {
    async fn detect(&self) -> Result<Vec<OrphanCandidate>>;
}

/// Detector over a fixed candidate list.
#[derive(Debug, Clone, Default)]
pub struct StaticOrphanDetector {
    candidates: Vec<OrphanCandidate>,
}

impl StaticOrphanDetector {
    pub fn new(candidates: Vec<OrphanCandidate>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl OrphanDetector for StaticOrphanDetector {
    async fn detect(&self) -> Result<Vec<OrphanCandidate>> {
        Ok(self.candidates.clone())
    }
}

/// Detector reading a JSON list of `{arquivo, referenciado?}` produced by an
/// external analysis step.
///
/// Unlike persisted engine state, a missing or malformed candidates document
/// is an error: an empty list would silently prune nothing and hide the
/// misconfiguration.
pub struct DocumentOrphanDetector {
    state: Arc<dyn StateStore>,
    path: PathBuf,
}

impl DocumentOrphanDetector {
    pub fn new(state: Arc<dyn StateStore>, path: impl Into<PathBuf>) -> Self {
        Self {
            state,
            path: path.into(),
        }
    }
}

#[async_trait]
impl OrphanDetector for DocumentOrphanDetector {
    async fn detect(&self) -> Result<Vec<OrphanCandidate>> {
        let mut candidates: Vec<OrphanCandidate> = read_json(self.state.as_ref(), &self.path)
            .await
            .map_err(|e| VigilError::Detector(e.to_string()))?;
        for c in &mut candidates {
            c.path = normalize_rel_path(&c.path);
        }
        candidates.retain(|c| !c.path.is_empty());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use vigil_state::fakes::MemoryStateStore;

    #[test]
    fn referenced_maps_to_inactive() {
        assert_eq!(OrphanCandidate::referenced("a").reason(), PruneReason::Inactive);
        assert_eq!(OrphanCandidate::orphan("a").reason(), PruneReason::Orphan);
        let explicit_false = OrphanCandidate {
            path: "a".into(),
            referenced: Some(false),
        };
        assert_eq!(explicit_false.reason(), PruneReason::Orphan);
    }

    #[tokio::test]
    async fn document_detector_reads_and_normalizes() {
        let mem = Arc::new(MemoryStateStore::new());
        mem.write(
            Path::new("candidates.json"),
            br#"[{"arquivo":".\\src\\old.js"},{"arquivo":"lib/used.js","referenciado":true},{"arquivo":""}]"#,
        )
        .await
        .unwrap();
        let detector = DocumentOrphanDetector::new(mem, "candidates.json");
        let found = detector.detect().await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, "src/old.js");
        assert_eq!(found[1].reason(), PruneReason::Inactive);
    }

    #[tokio::test]
    async fn document_detector_missing_file_is_error() {
        let mem = Arc::new(MemoryStateStore::new());
        let detector = DocumentOrphanDetector::new(mem, "nope.json");
        assert!(matches!(
            detector.detect().await,
            Err(VigilError::Detector(_))
        ));
    }
}
