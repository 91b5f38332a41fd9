use std::collections::HashSet;
use std::ffi::OsString;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinError;
use tracing::debug;

use super::model::{HistoryEntry, MoveFailure, PendingItem, PlannedMove, PruneReason};
use crate::config::EngineConfig;
use crate::error::{Result, VigilError};
use crate::metrics::METRICS;
use crate::obs;

/// Result of one batch of moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveSummary {
    pub moved: Vec<String>,
    pub failures: Vec<MoveFailure>,
}

/// Relocates pruned files into the holding area.
///
/// Moves run concurrently under a fixed bound. Each item succeeds or fails
/// on its own; a failure never cancels its siblings.
///
/// The optional deadline covers preparing the holding-area target. Once the
/// rename is issued it runs to completion, so a timed-out item always still
/// sits at its source and every file that reached the holding area has a
/// history entry.
#[derive(Debug, Clone)]
pub struct QuarantineMover {
    base: PathBuf,
    abandoned_dir: PathBuf,
    concurrency: usize,
    timeout: Option<Duration>,
}

impl QuarantineMover {
    /// `abandoned_dir` is resolved against `base` unless absolute.
    pub fn new(base: impl Into<PathBuf>, abandoned_dir: impl AsRef<Path>, concurrency: usize) -> Self {
        let base = base.into();
        let abandoned_dir = base.join(abandoned_dir);
        Self {
            base,
            abandoned_dir,
            concurrency: concurrency.max(1),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.root, &config.abandoned_dir, config.move_concurrency)
            .with_timeout(config.move_timeout())
    }

    /// Resolve source and target for `item` without touching the disk.
    ///
    /// Absolute paths and paths that climb out of the base are rejected.
    pub fn plan(&self, item: &PendingItem) -> Result<PlannedMove> {
        let rel = Path::new(&item.path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if item.path.is_empty() || rel.is_absolute() || escapes {
            return Err(VigilError::UnsafePath(item.path.clone()));
        }
        Ok(PlannedMove {
            path: item.path.clone(),
            source: self.base.join(rel),
            target: self.abandoned_dir.join(rel),
        })
    }

    /// Move every item, appending a history entry per completed move.
    pub async fn move_all(&self, items: &[PendingItem], history: &mut Vec<HistoryEntry>) -> MoveSummary {
        let mut summary = MoveSummary::default();
        let mut seen = HashSet::new();
        let mut work: Vec<(PlannedMove, PruneReason)> = Vec::new();

        for item in items {
            if !seen.insert(item.path.as_str()) {
                debug!(path = %item.path, "duplicate prune item skipped");
                continue;
            }
            match self.plan(item) {
                Ok(plan) => work.push((plan, item.reason)),
                Err(e) => record_failure(&mut summary, &item.path, &e),
            }
        }

        let paths: Vec<String> = work.iter().map(|(plan, _)| plan.path.clone()).collect();
        let log = Arc::new(Mutex::new(std::mem::take(history)));
        let shared = Arc::clone(&log);
        let deadline = self.timeout;

        let results = run_bounded(work, self.concurrency, move |(plan, reason)| {
            let log = Arc::clone(&shared);
            async move {
                let target = relocate(&plan, deadline).await?;
                log.lock().await.push(HistoryEntry {
                    path: plan.path.clone(),
                    moved_at: Utc::now(),
                    reason,
                });
                Ok::<PathBuf, VigilError>(target)
            }
        })
        .await;

        for (path, joined) in paths.into_iter().zip(results) {
            match joined {
                Ok(Ok(target)) => {
                    METRICS.inc_files_moved();
                    obs::emit_file_moved(&path, &target.display().to_string());
                    summary.moved.push(path);
                }
                Ok(Err(e)) => record_failure(&mut summary, &path, &e),
                Err(join_err) => record_failure(&mut summary, &path, &join_err),
            }
        }

        *history = match Arc::try_unwrap(log) {
            Ok(m) => m.into_inner(),
            Err(shared) => shared.lock().await.clone(),
        };
        summary
    }
}

/// Run `op` over `inputs` with at most `limit` operations in flight.
///
/// One task per input; results come back in input order. A panicking
/// operation surfaces as its `JoinError` without affecting the others.
pub(crate) async fn run_bounded<T, F, Fut>(
    inputs: Vec<T>,
    limit: usize,
    op: F,
) -> Vec<std::result::Result<Fut::Output, JoinError>>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    let op = Arc::new(op);
    let sem = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = Vec::with_capacity(inputs.len());

    for input in inputs {
        let op = Arc::clone(&op);
        let sem = Arc::clone(&sem);
        tasks.push(tokio::spawn(async move {
            let _permit = sem.acquire_owned().await.ok();
            op(input).await
        }));
    }

    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(task.await);
    }
    results
}

fn record_failure(summary: &mut MoveSummary, path: &str, error: &dyn std::fmt::Display) {
    METRICS.inc_move_failures();
    obs::emit_move_failed(path, error);
    summary.failures.push(MoveFailure {
        path: path.to_string(),
        error: error.to_string(),
    });
}

/// Await `fut` under an optional deadline; running out is a `MoveTimeout`.
async fn within_deadline<T, Fut>(deadline: Option<Duration>, path: &str, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match deadline {
        None => fut.await,
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| VigilError::MoveTimeout {
                path: path.to_string(),
                timeout_ms: limit.as_millis() as u64,
            })?,
    }
}

/// Create the target's parent and pick a free target name.
///
/// An earlier quarantined copy at the same target is kept: the new file
/// gets a `.<epoch-ms>` suffix instead of replacing it.
async fn prepare_target(plan: &PlannedMove) -> Result<PathBuf> {
    if let Some(parent) = plan.target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| VigilError::io(parent, e))?;
    }

    let mut target = plan.target.clone();
    let exists = tokio::fs::try_exists(&target)
        .await
        .map_err(|e| VigilError::io(&target, e))?;
    if exists {
        let mut name: OsString = target.file_name().map(OsString::from).unwrap_or_default();
        name.push(format!(".{}", Utc::now().timestamp_millis()));
        target.set_file_name(name);
    }
    Ok(target)
}

/// Rename `plan.source` into the holding area and return the final target.
///
/// Only preparation is bounded by `deadline`; the rename itself is never
/// abandoned midway.
async fn relocate(plan: &PlannedMove, deadline: Option<Duration>) -> Result<PathBuf> {
    let target = within_deadline(deadline, &plan.path, prepare_target(plan)).await?;
    tokio::fs::rename(&plan.source, &target)
        .await
        .map_err(|e| VigilError::io(&plan.source, e))?;
    Ok(target)
}
