use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a file is a quarantine candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PruneReason {
    /// Nothing references the file.
    #[serde(rename = "orfao", alias = "órfão")]
    Orphan,
    /// Referenced, but considered inactive.
    #[serde(rename = "inativo")]
    Inactive,
}

impl PruneReason {
    pub fn as_str(self) -> &'static str {
        match self {
            PruneReason::Orphan => "orfao",
            PruneReason::Inactive => "inativo",
        }
    }
}

impl fmt::Display for PruneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate awaiting a quarantine decision, carried across runs.
///
/// `schedule_at` is recorded but does not gate pruning: every candidate
/// that is not reactivated is pruned on the run it is seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingItem {
    #[serde(rename = "arquivo")]
    pub path: String,
    #[serde(rename = "motivo")]
    pub reason: PruneReason,
    /// Epoch milliseconds of the latest detection.
    #[serde(rename = "detectedAt")]
    pub detected_at: i64,
    #[serde(rename = "scheduleAt")]
    pub schedule_at: i64,
}

impl PendingItem {
    /// A fresh detection at `now_ms`.
    pub fn detected(path: impl Into<String>, reason: PruneReason, now_ms: i64) -> Self {
        Self {
            path: path.into(),
            reason,
            detected_at: now_ms,
            schedule_at: now_ms,
        }
    }
}

/// Audit record of one completed quarantine move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "arquivo")]
    pub path: String,
    #[serde(rename = "movidoEm")]
    pub moved_at: DateTime<Utc>,
    #[serde(rename = "motivo")]
    pub reason: PruneReason,
}

/// Whether a prune run touches the filesystem and persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Simulated,
    Real,
}

impl RunMode {
    pub fn from_execute_flag(execute: bool) -> Self {
        if execute {
            RunMode::Real
        } else {
            RunMode::Simulated
        }
    }

    pub fn is_simulated(self) -> bool {
        self == RunMode::Simulated
    }
}

/// Resolved source and holding-area target for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMove {
    pub path: String,
    pub source: PathBuf,
    pub target: PathBuf,
}

/// A candidate that could not be relocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveFailure {
    pub path: String,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_item_uses_wire_keys() {
        let item = PendingItem::detected("old.js", PruneReason::Orphan, 1_700_000_000_000);
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["arquivo"], "old.js");
        assert_eq!(v["motivo"], "orfao");
        assert_eq!(v["detectedAt"], 1_700_000_000_000i64);
        assert_eq!(v["scheduleAt"], 1_700_000_000_000i64);
    }

    #[test]
    fn legacy_accented_reason_is_accepted() {
        let item: PendingItem = serde_json::from_str(
            r#"{"arquivo":"a.js","motivo":"órfão","detectedAt":1,"scheduleAt":1}"#,
        )
        .unwrap();
        assert_eq!(item.reason, PruneReason::Orphan);
    }

    #[test]
    fn history_entry_parses_iso_timestamp() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{"arquivo":"a.js","movidoEm":"2024-05-01T10:00:00.000Z","motivo":"inativo"}"#,
        )
        .unwrap();
        assert_eq!(entry.reason, PruneReason::Inactive);
        assert_eq!(entry.moved_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn run_mode_from_flag() {
        assert!(RunMode::from_execute_flag(false).is_simulated());
        assert!(!RunMode::from_execute_flag(true).is_simulated());
    }
}
