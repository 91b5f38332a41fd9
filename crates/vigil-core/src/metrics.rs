//! Global atomic counters for Vigil observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a command).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Process-wide counters for moves, drift and baseline writes.
pub struct Metrics {
    files_moved: AtomicU64,
    move_failures: AtomicU64,
    drift_detected: AtomicU64,
    baselines_saved: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            files_moved: AtomicU64::new(0),
            move_failures: AtomicU64::new(0),
            drift_detected: AtomicU64::new(0),
            baselines_saved: AtomicU64::new(0),
        }
    }

    /// Increment the files-moved counter by one.
    pub fn inc_files_moved(&self) {
        self.files_moved.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "files_moved", "counter incremented");
    }

    /// Increment the move-failures counter by one.
    pub fn inc_move_failures(&self) {
        self.move_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "move_failures", "counter incremented");
    }

    /// Add `n` drifted paths to the drift counter.
    pub fn add_drift_detected(&self, n: u64) {
        self.drift_detected.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "drift_detected", n, "counter incremented");
    }

    /// Increment the baselines-saved counter by one.
    pub fn inc_baselines_saved(&self) {
        self.baselines_saved.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "baselines_saved", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            files_moved = self.files_moved(),
            move_failures = self.move_failures(),
            drift_detected = self.drift_detected(),
            baselines_saved = self.baselines_saved(),
        );
    }

    pub fn files_moved(&self) -> u64 {
        self.files_moved.load(Ordering::Relaxed)
    }

    pub fn move_failures(&self) -> u64 {
        self.move_failures.load(Ordering::Relaxed)
    }

    pub fn drift_detected(&self) -> u64 {
        self.drift_detected.load(Ordering::Relaxed)
    }

    pub fn baselines_saved(&self) -> u64 {
        self.baselines_saved.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.files_moved.store(0, Ordering::Relaxed);
        self.move_failures.store(0, Ordering::Relaxed);
        self.drift_detected.store(0, Ordering::Relaxed);
        self.baselines_saved.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.files_moved(), 0);
        m.inc_files_moved();
        m.inc_files_moved();
        assert_eq!(m.files_moved(), 2);

        m.inc_move_failures();
        assert_eq!(m.move_failures(), 1);

        m.add_drift_detected(3);
        assert_eq!(m.drift_detected(), 3);

        m.inc_baselines_saved();
        assert_eq!(m.baselines_saved(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_files_moved();
        m.inc_move_failures();
        m.add_drift_detected(2);
        m.inc_baselines_saved();
        m.reset();
        assert_eq!(m.files_moved(), 0);
        assert_eq!(m.move_failures(), 0);
        assert_eq!(m.drift_detected(), 0);
        assert_eq!(m.baselines_saved(), 0);
    }
}
