use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use vigil_state::{read_json, write_json, StateStore};

use super::fingerprint::Fingerprinter;
use crate::entry::FileEntry;
use crate::error::Result;
use crate::metrics::METRICS;

/// One baseline record: tracked path and its accepted digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityRecord {
    #[serde(rename = "arquivo")]
    pub path: String,
    pub hash: String,
}

/// Persists the integrity baseline as a single document.
///
/// `save` always replaces the whole record set; merging with a previous
/// baseline is the caller's responsibility.
#[derive(Clone)]
pub struct IntegrityStore {
    state: Arc<dyn StateStore>,
    fingerprinter: Fingerprinter,
}

impl IntegrityStore {
    pub fn new(state: Arc<dyn StateStore>, fingerprinter: Fingerprinter) -> Self {
        Self {
            state,
            fingerprinter,
        }
    }

    pub fn fingerprinter(&self) -> &Fingerprinter {
        &self.fingerprinter
    }

    /// Fingerprint every trackable entry. A repeated path keeps its last entry.
    pub fn build_records(&self, entries: &[FileEntry]) -> Vec<IntegrityRecord> {
        let mut order: Vec<&str> = Vec::new();
        let mut hashes: BTreeMap<&str, String> = BTreeMap::new();
        for entry in entries {
            let Some(content) = entry.trackable_content() else {
                continue;
            };
            let hash = self.fingerprinter.snapshot(content).hash;
            if hashes.insert(entry.rel_path.as_str(), hash).is_none() {
                order.push(entry.rel_path.as_str());
            }
        }
        order
            .into_iter()
            .filter_map(|path| {
                hashes.remove(path).map(|hash| IntegrityRecord {
                    path: path.to_string(),
                    hash,
                })
            })
            .collect()
    }

    /// Fingerprint `entries` and write them to `destination` as the new baseline.
    ///
    /// Returns the number of records written.
    pub async fn save(&self, entries: &[FileEntry], destination: &Path) -> Result<usize> {
        let records = self.build_records(entries);
        write_json(self.state.as_ref(), destination, &records).await?;
        METRICS.inc_baselines_saved();
        info!(
            path = %destination.display(),
            records = records.len(),
            "integrity baseline saved"
        );
        Ok(records.len())
    }

    /// Load the baseline at `source`. Any read failure yields an empty baseline.
    pub async fn load(&self, source: &Path) -> Vec<IntegrityRecord> {
        match read_json::<Vec<IntegrityRecord>, _>(self.state.as_ref(), source).await {
            Ok(records) => records,
            Err(e) => {
                info!(path = %source.display(), error = %e, "no integrity baseline found");
                Vec::new()
            }
        }
    }

    /// Load the baseline keyed by path; a repeated path keeps its last hash.
    pub async fn load_map(&self, source: &Path) -> BTreeMap<String, String> {
        baseline_map(&self.load(source).await)
    }
}

pub(crate) fn baseline_map(records: &[IntegrityRecord]) -> BTreeMap<String, String> {
    records
        .iter()
        .map(|r| (r.path.clone(), r.hash.clone()))
        .collect()
}
