//! Content fingerprinting.
//!
//! A [`Fingerprinter`] walks a priority list of hash algorithms and uses the
//! first one the runtime policy allows. With an empty list it degrades to a
//! 32-bit rolling checksum, so fingerprinting never fails.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256, Sha512};

use crate::error::VigilError;

/// Characters of the first line kept in a [`Snapshot`] sample.
pub const SAMPLE_CHARS: usize = 200;

/// Hash algorithms the fingerprinter can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Blake3,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Primary fast algorithm first, then the cryptographic fallbacks.
    pub const fn default_priority() -> &'static [HashAlgorithm] {
        &[HashAlgorithm::Blake3, HashAlgorithm::Sha256, HashAlgorithm::Sha512]
    }

    /// Whether this build can compute the algorithm.
    pub fn is_available(self) -> bool {
        match self {
            HashAlgorithm::Blake3 | HashAlgorithm::Sha256 | HashAlgorithm::Sha512 => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    fn hex_digest(self, data: &[u8]) -> String {
        match self {
            HashAlgorithm::Blake3 => blake3::hash(data).to_hex().to_string(),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
            HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blake3" => Ok(HashAlgorithm::Blake3),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "sha512" | "sha-512" => Ok(HashAlgorithm::Sha512),
            _ => Err(VigilError::InvalidConfig(format!(
                "unknown hash algorithm: {s}"
            ))),
        }
    }
}

/// Per-file diagnostic snapshot. Only `hash` is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub hash: String,
    pub line_count: usize,
    pub sample: String,
}

/// Digest producer with a fixed algorithm choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprinter {
    algorithm: Option<HashAlgorithm>,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(HashAlgorithm::default_priority())
    }
}

impl Fingerprinter {
    /// Select the first available algorithm from `priority`.
    pub fn new(priority: &[HashAlgorithm]) -> Self {
        let algorithm = priority.iter().copied().find(|a| a.is_available());
        if algorithm.is_none() {
            tracing::debug!("no hash algorithm available, using rolling checksum");
        }
        Self { algorithm }
    }

    /// Selected algorithm; `None` means the rolling checksum fallback.
    pub fn algorithm(&self) -> Option<HashAlgorithm> {
        self.algorithm
    }

    /// Hex digest of `content`.
    pub fn digest(&self, content: &str) -> String {
        match self.algorithm {
            Some(alg) => alg.hex_digest(content.as_bytes()),
            None => rolling_checksum(content),
        }
    }

    pub fn snapshot(&self, content: &str) -> Snapshot {
        let first_line = content.split('\n').next().unwrap_or_default();
        Snapshot {
            hash: self.digest(content),
            line_count: content.split('\n').count(),
            sample: first_line.chars().take(SAMPLE_CHARS).collect(),
        }
    }
}

/// `h = h * 31 + unit (mod 2^32)` over UTF-16 code units, as 8 hex chars.
pub fn rolling_checksum(content: &str) -> String {
    let hash = content
        .encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)));
    format!("{hash:08x}")
}
