//! Integrity subsystem: fingerprinting, baseline persistence, verification
//! and the self-healing watchdog.

pub mod fingerprint;
pub mod store;
pub mod verify;
pub mod watchdog;

pub use fingerprint::{rolling_checksum, Fingerprinter, HashAlgorithm, Snapshot, SAMPLE_CHARS};
pub use store::{IntegrityRecord, IntegrityStore};
pub use verify::{diff_baseline, verify, BaselineDiff, Verification};
pub use watchdog::{SilentWatchdog, WatchReport};
