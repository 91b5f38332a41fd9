//! Engine configuration.
//!
//! Every mode and path the engine consumes lives on [`EngineConfig`] and is
//! passed explicitly; nothing is read from process-wide state after the
//! config has been resolved. Resolution order: defaults, then an optional
//! JSON config file, then `VIGIL_*` environment variables, then CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, VigilError};
use crate::integrity::HashAlgorithm;

/// Config file looked up at the repository root when none is given.
pub const CONFIG_FILE_NAME: &str = "vigil.config.json";

/// Default state directory, relative to the repository root.
pub const DEFAULT_STATE_DIR: &str = ".vigil";

/// Default bound on concurrent quarantine moves.
pub const DEFAULT_MOVE_CONCURRENCY: usize = 5;

/// Paths and limits for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Repository root. Relative paths below resolve against it.
    pub root: PathBuf,
    pub state_dir: PathBuf,
    /// Holding area for quarantined files.
    pub abandoned_dir: PathBuf,
    pub integrity_path: PathBuf,
    pub pending_path: PathBuf,
    pub reactivate_path: PathBuf,
    pub history_path: PathBuf,
    /// Machine-readable prune report; the markdown report sits next to it.
    pub report_path: PathBuf,
    pub move_concurrency: usize,
    pub move_timeout_ms: Option<u64>,
    /// Fingerprint algorithms in priority order. Empty selects the checksum fallback.
    pub hash_algorithms: Vec<HashAlgorithm>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_root(".")
    }
}

impl EngineConfig {
    /// Defaults for a repository rooted at `root`.
    pub fn for_root(root: impl AsRef<Path>) -> Self {
        let mut config = Self {
            root: root.as_ref().to_path_buf(),
            state_dir: PathBuf::new(),
            abandoned_dir: PathBuf::new(),
            integrity_path: PathBuf::new(),
            pending_path: PathBuf::new(),
            reactivate_path: PathBuf::new(),
            history_path: PathBuf::new(),
            report_path: PathBuf::new(),
            move_concurrency: DEFAULT_MOVE_CONCURRENCY,
            move_timeout_ms: None,
            hash_algorithms: HashAlgorithm::default_priority().to_vec(),
        };
        config.rebase_state_dir(DEFAULT_STATE_DIR);
        config
    }

    /// Move the state directory and every document under it.
    pub fn rebase_state_dir(&mut self, state_dir: impl AsRef<Path>) {
        let dir = state_dir.as_ref().to_path_buf();
        self.abandoned_dir = dir.join("abandoned");
        self.integrity_path = dir.join("integrity.json");
        self.pending_path = dir.join("pending.json");
        self.reactivate_path = dir.join("reactivate.json");
        self.history_path = dir.join("history.json");
        self.report_path = dir.join("prune-report.json");
        self.state_dir = dir;
    }

    /// Load defaults for `root`, overlaid with a JSON config file.
    ///
    /// An explicit `config_path` must exist. Without one, `vigil.config.json`
    /// at the root is used when present.
    pub fn load(root: impl AsRef<Path>, config_path: Option<&Path>) -> Result<Self> {
        let root = root.as_ref();
        let candidate = match config_path {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let default = root.join(CONFIG_FILE_NAME);
                default.is_file().then_some(default)
            }
        };

        let mut config = match candidate {
            Some(path) => {
                debug!(path = %path.display(), "loading engine config");
                let raw = std::fs::read_to_string(&path).map_err(|e| {
                    VigilError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
                })?;
                Self::from_json(&raw)?
            }
            None => Self::for_root(root),
        };
        config.root = root.to_path_buf();
        Ok(config)
    }

    /// Parse a JSON config document. Missing keys keep their defaults.
    ///
    /// When `state_dir` is given but document paths are not, the documents
    /// follow the state dir.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| VigilError::InvalidConfig(format!("config is not valid JSON: {e}")))?;
        let mut base = Self::default();
        if let Some(dir) = value.get("state_dir").and_then(|v| v.as_str()) {
            base.rebase_state_dir(dir);
        }
        let mut merged = serde_json::to_value(&base)?;
        if let (Some(target), Some(source)) = (merged.as_object_mut(), value.as_object()) {
            for (k, v) in source {
                target.insert(k.clone(), v.clone());
            }
        }
        let config: Self = serde_json::from_value(merged)
            .map_err(|e| VigilError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `VIGIL_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("VIGIL_STATE_DIR") {
            self.rebase_state_dir(dir);
        }
        if let Some(raw) = lookup("VIGIL_MOVE_CONCURRENCY") {
            self.move_concurrency = raw.trim().parse().map_err(|_| {
                VigilError::InvalidConfig(format!("VIGIL_MOVE_CONCURRENCY not a number: {raw}"))
            })?;
        }
        if let Some(raw) = lookup("VIGIL_MOVE_TIMEOUT_MS") {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                VigilError::InvalidConfig(format!("VIGIL_MOVE_TIMEOUT_MS not a number: {raw}"))
            })?;
            self.move_timeout_ms = (ms > 0).then_some(ms);
        }
        if let Some(raw) = lookup("VIGIL_HASH_ALGORITHMS") {
            self.hash_algorithms = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<HashAlgorithm>)
                .collect::<Result<Vec<_>>>()?;
        }
        self.validate()
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.move_concurrency == 0 {
            return Err(VigilError::InvalidConfig(
                "move_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve `path` against the repository root unless it is absolute.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Markdown report path, derived from the JSON report path.
    pub fn markdown_report_path(&self) -> PathBuf {
        match self.report_path.extension().and_then(|e| e.to_str()) {
            Some("json") => self.report_path.with_extension("md"),
            _ => {
                let mut p = self.report_path.clone().into_os_string();
                p.push(".md");
                PathBuf::from(p)
            }
        }
    }

    pub fn move_timeout(&self) -> Option<Duration> {
        self.move_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_live_under_state_dir() {
        let c = EngineConfig::for_root("/repo");
        assert_eq!(c.state_dir, PathBuf::from(".vigil"));
        assert_eq!(c.pending_path, PathBuf::from(".vigil/pending.json"));
        assert_eq!(c.abandoned_dir, PathBuf::from(".vigil/abandoned"));
        assert_eq!(c.move_concurrency, 5);
        assert_eq!(c.resolve(&c.history_path), PathBuf::from("/repo/.vigil/history.json"));
    }

    #[test]
    fn markdown_report_swaps_extension() {
        let c = EngineConfig::default();
        assert_eq!(c.markdown_report_path(), PathBuf::from(".vigil/prune-report.md"));
    }

    #[test]
    fn from_json_keeps_missing_defaults() {
        let c = EngineConfig::from_json(r#"{"move_concurrency": 2}"#).unwrap();
        assert_eq!(c.move_concurrency, 2);
        assert_eq!(c.integrity_path, PathBuf::from(".vigil/integrity.json"));
    }

    #[test]
    fn from_json_state_dir_moves_documents() {
        let c = EngineConfig::from_json(r#"{"state_dir": ".oraculo"}"#).unwrap();
        assert_eq!(c.pending_path, PathBuf::from(".oraculo/pending.json"));
    }

    #[test]
    fn from_json_rejects_zero_concurrency() {
        let err = EngineConfig::from_json(r#"{"move_concurrency": 0}"#).unwrap_err();
        assert!(matches!(err, VigilError::InvalidConfig(_)));
    }

    #[test]
    fn overrides_apply_in_order() {
        let env: HashMap<&str, &str> = [
            ("VIGIL_STATE_DIR", "state"),
            ("VIGIL_MOVE_CONCURRENCY", "8"),
            ("VIGIL_MOVE_TIMEOUT_MS", "1500"),
            ("VIGIL_HASH_ALGORITHMS", "sha256, sha512"),
        ]
        .into_iter()
        .collect();
        let mut c = EngineConfig::default();
        c.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(c.history_path, PathBuf::from("state/history.json"));
        assert_eq!(c.move_concurrency, 8);
        assert_eq!(c.move_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(
            c.hash_algorithms,
            vec![HashAlgorithm::Sha256, HashAlgorithm::Sha512]
        );
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let mut c = EngineConfig::default();
        let err = c
            .apply_overrides_from(|k| (k == "VIGIL_HASH_ALGORITHMS").then(|| "md5".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("md5"));
    }

    #[test]
    fn load_reads_root_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"hash_algorithms": []}"#,
        )
        .unwrap();
        let c = EngineConfig::load(dir.path(), None).unwrap();
        assert!(c.hash_algorithms.is_empty());
        assert_eq!(c.root.as_path(), dir.path());
    }

    #[test]
    fn load_missing_explicit_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(EngineConfig::load(dir.path(), Some(&missing)).is_err());
    }
}
