//! Stateless baseline comparison.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::fingerprint::Fingerprinter;
use super::store::{baseline_map, IntegrityRecord};
use crate::entry::FileEntry;

/// Outcome of a verification pass.
///
/// `verified` is the size of the baseline, not the number of comparisons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    #[serde(rename = "corrompidos")]
    pub corrupted: Vec<String>,
    #[serde(rename = "verificados")]
    pub verified: usize,
}

impl Verification {
    pub fn is_clean(&self) -> bool {
        self.corrupted.is_empty()
    }
}

/// Full comparison between current entries and a baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

impl BaselineDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Paths present in both `entries` and `baseline` whose digests differ, in
/// entry order. Paths missing on either side are ignored.
pub(crate) fn drifted_paths(
    fingerprinter: &Fingerprinter,
    entries: &[FileEntry],
    baseline: &BTreeMap<String, String>,
) -> Vec<String> {
    let mut corrupted = Vec::new();
    for entry in entries {
        let Some(content) = entry.trackable_content() else {
            continue;
        };
        let Some(expected) = baseline.get(&entry.rel_path) else {
            continue;
        };
        if fingerprinter.digest(content) != *expected {
            corrupted.push(entry.rel_path.clone());
        }
    }
    corrupted
}

/// Compare `entries` against `baseline` and report content drift.
pub fn verify(
    fingerprinter: &Fingerprinter,
    entries: &[FileEntry],
    baseline: &[IntegrityRecord],
) -> Verification {
    let map = baseline_map(baseline);
    Verification {
        corrupted: drifted_paths(fingerprinter, entries, &map),
        verified: baseline.len(),
    }
}

/// Compare `entries` against `baseline`, including additions and removals.
pub fn diff_baseline(
    fingerprinter: &Fingerprinter,
    entries: &[FileEntry],
    baseline: &[IntegrityRecord],
) -> BaselineDiff {
    let map = baseline_map(baseline);
    let current: BTreeSet<&str> = entries
        .iter()
        .filter(|e| e.trackable_content().is_some())
        .map(|e| e.rel_path.as_str())
        .collect();

    let added = current
        .iter()
        .filter(|p| !map.contains_key(**p))
        .map(|p| p.to_string())
        .collect();
    let removed = map
        .keys()
        .filter(|p| !current.contains(p.as_str()))
        .cloned()
        .collect();
    let mut changed = drifted_paths(fingerprinter, entries, &map);
    changed.sort();
    changed.dedup();

    BaselineDiff {
        added,
        removed,
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, hash: &str) -> IntegrityRecord {
        IntegrityRecord {
            path: path.to_string(),
            hash: hash.to_string(),
        }
    }

    #[test]
    fn unchanged_content_is_clean() {
        let f = Fingerprinter::default();
        let baseline = vec![record("a.ts", &f.digest("X"))];
        let result = verify(&f, &[FileEntry::new("a.ts", "X")], &baseline);
        assert_eq!(
            result,
            Verification {
                corrupted: vec![],
                verified: 1
            }
        );
    }

    #[test]
    fn changed_content_is_corrupted() {
        let f = Fingerprinter::default();
        let baseline = vec![record("a.ts", &f.digest("X"))];
        let result = verify(&f, &[FileEntry::new("a.ts", "Y")], &baseline);
        assert_eq!(result.corrupted, vec!["a.ts".to_string()]);
        assert_eq!(result.verified, 1);
    }

    #[test]
    fn additions_and_deletions_are_ignored() {
        let f = Fingerprinter::default();
        let baseline = vec![record("gone.ts", "deadbeef"), record("b.ts", &f.digest("b"))];
        let entries = vec![FileEntry::new("new.ts", "n"), FileEntry::new("b.ts", "b")];
        let result = verify(&f, &entries, &baseline);
        assert!(result.is_clean());
        assert_eq!(result.verified, 2);
    }

    #[test]
    fn blank_current_content_is_skipped() {
        let f = Fingerprinter::default();
        let baseline = vec![record("a.ts", &f.digest("X"))];
        let result = verify(&f, &[FileEntry::new("a.ts", "   ")], &baseline);
        assert!(result.is_clean());
    }

    #[test]
    fn empty_baseline_reports_zero_verified() {
        let f = Fingerprinter::default();
        let result = verify(&f, &[FileEntry::new("a.ts", "X")], &[]);
        assert!(result.is_clean());
        assert_eq!(result.verified, 0);
    }

    #[test]
    fn serializes_with_wire_keys() {
        let v = serde_json::to_value(Verification {
            corrupted: vec!["a.ts".into()],
            verified: 3,
        })
        .unwrap();
        assert_eq!(v["corrompidos"][0], "a.ts");
        assert_eq!(v["verificados"], 3);
    }

    #[test]
    fn diff_reports_added_removed_changed() {
        let f = Fingerprinter::default();
        let baseline = vec![
            record("keep.ts", &f.digest("same")),
            record("edit.ts", &f.digest("before")),
            record("gone.ts", &f.digest("bye")),
        ];
        let entries = vec![
            FileEntry::new("keep.ts", "same"),
            FileEntry::new("edit.ts", "after"),
            FileEntry::new("fresh.ts", "hello"),
            FileEntry::new("empty.ts", ""),
        ];
        let diff = diff_baseline(&f, &entries, &baseline);
        assert_eq!(diff.added, vec!["fresh.ts".to_string()]);
        assert_eq!(diff.removed, vec!["gone.ts".to_string()]);
        assert_eq!(diff.changed, vec!["edit.ts".to_string()]);
        assert!(!diff.is_empty());
    }
}
