use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::store::IntegrityStore;
use super::verify::drifted_paths;
use crate::entry::FileEntry;
use crate::metrics::METRICS;
use crate::obs;

/// What a watchdog pass observed and did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchReport {
    pub drifted: Vec<String>,
    /// Size of the baseline that was loaded.
    pub verified: usize,
    /// True when the drift was absorbed into a freshly saved baseline.
    pub baseline_reset: bool,
}

/// Self-healing integrity watchdog.
///
/// Drift is reported as a warning and, with auto-reset, absorbed into the
/// baseline immediately. Nothing but the log line records the violation.
/// A pass never fails.
#[derive(Clone)]
pub struct SilentWatchdog {
    store: IntegrityStore,
}

impl SilentWatchdog {
    pub fn new(store: IntegrityStore) -> Self {
        Self { store }
    }

    #[instrument(skip(self, entries, path), fields(path = %path.display(), entries = entries.len()))]
    pub async fn watch(&self, entries: &[FileEntry], path: &Path, auto_reset: bool) -> WatchReport {
        let baseline = self.store.load_map(path).await;
        let drifted = drifted_paths(self.store.fingerprinter(), entries, &baseline);

        let mut report = WatchReport {
            drifted,
            verified: baseline.len(),
            baseline_reset: false,
        };
        if report.drifted.is_empty() {
            return report;
        }

        METRICS.add_drift_detected(report.drifted.len() as u64);
        obs::emit_drift_detected(&path.display().to_string(), report.drifted.len());
        warn!("changes detected in {} file(s)", report.drifted.len());
        for p in &report.drifted {
            info!("  - {p}");
        }

        if auto_reset {
            match self.store.save(entries, path).await {
                Ok(_) => {
                    report.baseline_reset = true;
                    info!("integrity baseline recalibrated");
                }
                Err(e) => warn!(error = %e, "failed to recalibrate integrity baseline"),
            }
        }
        report
    }
}
