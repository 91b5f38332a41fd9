//! Structured observability hooks for integrity and quarantine runs.
//!
//! This module provides:
//! - Run-scoped tracing spans via [`run_span`]
//! - Emission functions for key events: drift, prune start/finish, per-file moves
//!
//! Events are emitted at `info!` level, failures at `warn!`/`error!`.
//! For JSON output, pass `--json` to the CLI.

use tracing::info;

/// Span tagging every event of one run with its `run_id`.
///
/// Attach it to the run future with `tracing::Instrument` rather than
/// entering it, so the future stays `Send`.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("vigil.run", run_id = %run_id)
}

/// Emit event: drift found against a baseline.
pub fn emit_drift_detected(baseline: &str, drifted: usize) {
    tracing::warn!(event = "integrity.drift", baseline = %baseline, drifted = drifted);
}

/// Emit event: prune run started.
pub fn emit_prune_started(run_id: &str, simulated: bool) {
    info!(event = "prune.started", run_id = %run_id, simulated = simulated);
}

/// Emit event: prune run finished with partition and move counts.
pub fn emit_prune_finished(
    run_id: &str,
    pruned: usize,
    kept: usize,
    moved: usize,
    failed: usize,
) {
    info!(
        event = "prune.finished",
        run_id = %run_id,
        pruned = pruned,
        kept = kept,
        moved = moved,
        failed = failed,
    );
}

/// Emit event: one file relocated into the holding area.
pub fn emit_file_moved(path: &str, target: &str) {
    info!(event = "prune.file_moved", path = %path, target = %target);
}

/// Emit event: one file could not be relocated (error level).
pub fn emit_move_failed(path: &str, error: &dyn std::fmt::Display) {
    tracing::error!(event = "prune.move_failed", path = %path, error = %error);
}

/// Emit event: simulated relocation, nothing touched.
pub fn emit_move_simulated(path: &str, target: &str) {
    info!(event = "prune.move_simulated", path = %path, target = %target);
}
