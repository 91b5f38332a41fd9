use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;
use vigil_state::{read_or_default, write_json, StateStore};

use super::detector::{OrphanCandidate, OrphanDetector};
use super::model::{HistoryEntry, MoveFailure, PendingItem, PlannedMove, RunMode};
use super::mover::QuarantineMover;
use super::report::{build_prune_report, render_prune_report_md, write_prune_reports, PruneReport};
use crate::config::EngineConfig;
use crate::entry::normalize_rel_path;
use crate::error::Result;
use crate::obs;

/// Everything one prune run decided and did.
#[derive(Debug, Clone, Serialize)]
pub struct PruneOutcome {
    pub run_id: String,
    pub mode: RunMode,
    pub pruned: Vec<PendingItem>,
    pub kept: Vec<PendingItem>,
    pub moved: Vec<String>,
    pub failures: Vec<MoveFailure>,
    pub planned: Vec<PlannedMove>,
    pub report: PruneReport,
    #[serde(skip)]
    pub markdown: String,
    /// State or report documents that could not be written.
    pub persist_errors: Vec<String>,
}

/// Split of the merged pending set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub keep: Vec<PendingItem>,
    pub prune: Vec<PendingItem>,
}

/// Turn detector output into fresh pending items stamped `now_ms`.
pub fn generate_pending(candidates: &[OrphanCandidate], now_ms: i64) -> Vec<PendingItem> {
    candidates
        .iter()
        .map(|c| PendingItem::detected(normalize_rel_path(&c.path), c.reason(), now_ms))
        .collect()
}

/// Union keyed by normalized path; a fresh item replaces a previous one.
pub fn merge_pending(previous: Vec<PendingItem>, fresh: Vec<PendingItem>) -> Vec<PendingItem> {
    let mut by_path: BTreeMap<String, PendingItem> = BTreeMap::new();
    for mut item in previous.into_iter().chain(fresh) {
        item.path = normalize_rel_path(&item.path);
        by_path.insert(item.path.clone(), item);
    }
    by_path.into_values().collect()
}

/// Reactivated paths are kept; everything else is pruned.
///
/// Both sides are compared in normalized form, so `./src/a.js` in the
/// reactivation list keeps `src/a.js`.
pub fn partition_pending(pending: Vec<PendingItem>, reactivate: &[String]) -> Partition {
    let reactivated: HashSet<String> = reactivate.iter().map(|p| normalize_rel_path(p)).collect();
    let (keep, prune) = pending
        .into_iter()
        .partition(|p| reactivated.contains(&normalize_rel_path(&p.path)));
    Partition { keep, prune }
}

/// Per-run quarantine state machine.
///
/// A run loads the pending, reactivation and history documents, merges in
/// the detector's candidates, partitions them and, on a real run, moves the
/// pruned files and persists the kept set and the history.
pub struct QuarantineScheduler {
    state: Arc<dyn StateStore>,
    detector: Arc<dyn OrphanDetector>,
    mover: QuarantineMover,
    config: EngineConfig,
}

impl QuarantineScheduler {
    pub fn new(
        state: Arc<dyn StateStore>,
        detector: Arc<dyn OrphanDetector>,
        config: EngineConfig,
    ) -> Self {
        let mover = QuarantineMover::from_config(&config);
        Self {
            state,
            detector,
            mover,
            config,
        }
    }

    pub async fn run(&self, mode: RunMode) -> Result<PruneOutcome> {
        self.run_at(mode, Utc::now()).await
    }

    /// Run with an explicit clock.
    pub async fn run_at(&self, mode: RunMode, now: DateTime<Utc>) -> Result<PruneOutcome> {
        let run_id = Uuid::new_v4().to_string();
        let span = obs::run_span(&run_id);
        self.execute(run_id, mode, now).instrument(span).await
    }

    async fn execute(&self, run_id: String, mode: RunMode, now: DateTime<Utc>) -> Result<PruneOutcome> {
        let simulated = mode.is_simulated();
        obs::emit_prune_started(&run_id, simulated);
        let store = self.state.as_ref();

        let (previous, reactivate, mut history) = tokio::join!(
            read_or_default::<Vec<PendingItem>, _>(store, &self.config.pending_path),
            read_or_default::<Vec<String>, _>(store, &self.config.reactivate_path),
            read_or_default::<Vec<HistoryEntry>, _>(store, &self.config.history_path),
        );

        let candidates = self.detector.detect().await?;
        let fresh = generate_pending(&candidates, now.timestamp_millis());
        let merged = merge_pending(previous, fresh);
        let Partition { keep, prune } = partition_pending(merged, &reactivate);

        let mut planned = Vec::new();
        let mut failures = Vec::new();
        for item in &prune {
            match self.mover.plan(item) {
                Ok(plan) => planned.push(plan),
                Err(e) if simulated => failures.push(MoveFailure {
                    path: item.path.clone(),
                    error: e.to_string(),
                }),
                Err(_) => {}
            }
        }

        let report = build_prune_report(&prune, &keep, now);
        let markdown = render_prune_report_md(&prune, &keep, now, simulated);
        let mut outcome = PruneOutcome {
            run_id,
            mode,
            pruned: Vec::new(),
            kept: Vec::new(),
            moved: Vec::new(),
            failures,
            planned,
            report,
            markdown,
            persist_errors: Vec::new(),
        };

        if prune.is_empty() {
            info!("nothing to prune");
            self.write_reports(&mut outcome).await;
            outcome.kept = keep;
            self.finish(&outcome);
            return Ok(outcome);
        }

        if simulated {
            for plan in &outcome.planned {
                obs::emit_move_simulated(&plan.path, &plan.target.display().to_string());
                info!(
                    "simulated: '{}' -> '{}'",
                    plan.source.display(),
                    plan.target.display()
                );
            }
            info!("dry run: {} file(s) would be pruned, nothing written", prune.len());
        } else {
            let summary = self.mover.move_all(&prune, &mut history).await;
            outcome.moved = summary.moved;
            outcome.failures = summary.failures;

            if let Err(e) = write_json(store, &self.config.pending_path, &keep).await {
                error!(error = %e, "failed to persist pending set");
                outcome.persist_errors.push(e.to_string());
            }
            if let Err(e) = write_json(store, &self.config.history_path, &history).await {
                error!(error = %e, "failed to persist move history");
                outcome.persist_errors.push(e.to_string());
            }
            self.write_reports(&mut outcome).await;
        }

        outcome.pruned = prune;
        outcome.kept = keep;
        self.finish(&outcome);
        Ok(outcome)
    }

    async fn write_reports(&self, outcome: &mut PruneOutcome) {
        let md_path = self.config.markdown_report_path();
        if let Err(e) = write_prune_reports(
            self.state.as_ref(),
            &self.config.report_path,
            &md_path,
            &outcome.report,
            &outcome.markdown,
        )
        .await
        {
            warn!(error = %e, "failed to write prune report");
            outcome.persist_errors.push(e.to_string());
        }
    }

    fn finish(&self, outcome: &PruneOutcome) {
        obs::emit_prune_finished(
            &outcome.run_id,
            outcome.report.total_pruned,
            outcome.report.total_kept,
            outcome.moved.len(),
            outcome.failures.len(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quarantine::PruneReason;

    #[test]
    fn generate_maps_referenced_to_inactive() {
        let items = generate_pending(
            &[OrphanCandidate::orphan("a"), OrphanCandidate::referenced("b")],
            42,
        );
        assert_eq!(items[0].reason, PruneReason::Orphan);
        assert_eq!(items[1].reason, PruneReason::Inactive);
        assert!(items.iter().all(|i| i.detected_at == 42 && i.schedule_at == 42));
    }

    #[test]
    fn merge_prefers_fresh_detection() {
        let previous = vec![
            PendingItem::detected("a", PruneReason::Orphan, 1),
            PendingItem::detected("b", PruneReason::Orphan, 1),
        ];
        let fresh = vec![PendingItem::detected("a", PruneReason::Inactive, 9)];
        let merged = merge_pending(previous, fresh);
        assert_eq!(merged.len(), 2);
        let a = merged.iter().find(|p| p.path == "a").unwrap();
        assert_eq!(a.detected_at, 9);
        assert_eq!(a.reason, PruneReason::Inactive);
    }

    #[test]
    fn reactivation_always_keeps() {
        let pending = vec![
            PendingItem::detected("a", PruneReason::Orphan, 1),
            PendingItem::detected("b", PruneReason::Orphan, 1),
        ];
        let part = partition_pending(pending, &["b".to_string(), "zzz".to_string()]);
        assert_eq!(part.keep.len(), 1);
        assert_eq!(part.keep[0].path, "b");
        assert_eq!(part.prune.len(), 1);
        assert_eq!(part.prune[0].path, "a");
    }

    #[test]
    fn merge_collapses_spellings_of_one_path() {
        let previous = vec![PendingItem::detected("./a.js", PruneReason::Orphan, 1)];
        let fresh = vec![PendingItem::detected("a.js", PruneReason::Inactive, 5)];
        let merged = merge_pending(previous, fresh);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].path, "a.js");
        assert_eq!(merged[0].detected_at, 5);

        let legacy = merge_pending(
            vec![PendingItem::detected("src\\b.js", PruneReason::Orphan, 1)],
            Vec::new(),
        );
        assert_eq!(legacy[0].path, "src/b.js");
    }

    #[test]
    fn reactivation_matches_normalized_paths() {
        let pending = vec![
            PendingItem::detected("src/keep.js", PruneReason::Orphan, 1),
            PendingItem::detected("src/drop.js", PruneReason::Orphan, 1),
        ];
        let part = partition_pending(pending, &["./src/keep.js".to_string()]);
        assert_eq!(part.keep.len(), 1);
        assert_eq!(part.keep[0].path, "src/keep.js");
        assert_eq!(part.prune[0].path, "src/drop.js");
    }

    #[test]
    fn generated_items_are_normalized() {
        let items = generate_pending(&[OrphanCandidate::orphan("./lib//x.js")], 1);
        assert_eq!(items[0].path, "lib/x.js");
    }

    #[test]
    fn schedule_at_does_not_gate() {
        let mut future = PendingItem::detected("a", PruneReason::Orphan, 1);
        future.schedule_at = i64::MAX;
        let part = partition_pending(vec![future], &[]);
        assert_eq!(part.prune.len(), 1);
    }
}
