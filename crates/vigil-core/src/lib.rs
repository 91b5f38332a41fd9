//! Vigil Core Library
//!
//! File integrity baselines and orphan quarantine for a source tree.
//! Re-exports the engine components for programmatic access.

pub mod config;
pub mod entry;
pub mod error;
pub mod integrity;
pub mod metrics;
pub mod obs;
pub mod quarantine;
pub mod scan;
pub mod telemetry;

pub use config::EngineConfig;
pub use entry::{normalize_rel_path, FileEntry};
pub use error::{Result, VigilError};

pub use integrity::{
    diff_baseline, rolling_checksum, verify, BaselineDiff, Fingerprinter, HashAlgorithm,
    IntegrityRecord, IntegrityStore, SilentWatchdog, Snapshot, Verification, WatchReport,
};

pub use quarantine::{
    DocumentOrphanDetector, HistoryEntry, MoveFailure, MoveSummary, OrphanCandidate,
    OrphanDetector, PendingItem, PlannedMove, PruneOutcome, PruneReason, PruneReport,
    QuarantineMover, QuarantineScheduler, RunMode, StaticOrphanDetector,
};

pub use scan::collect_entries;

pub use vigil_state::{JsonFileStore, StateStore};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
