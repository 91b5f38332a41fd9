//! Quarantine subsystem: candidate scheduling, concurrent relocation into
//! the holding area and the prune report.

pub mod detector;
pub mod model;
pub mod mover;
pub mod report;
pub mod scheduler;

pub use detector::{DocumentOrphanDetector, OrphanCandidate, OrphanDetector, StaticOrphanDetector};
pub use model::{HistoryEntry, MoveFailure, PendingItem, PlannedMove, PruneReason, RunMode};
pub use mover::{MoveSummary, QuarantineMover};
pub use report::{build_prune_report, days_inactive, render_prune_report_md, PruneReport};
pub use scheduler::{generate_pending, merge_pending, partition_pending, Partition, PruneOutcome, QuarantineScheduler};
