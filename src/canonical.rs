//! Canonical digests of conversion output.
//!
//! ## Determinism Guarantees
//!
//! - Same schema + same rule tree + same formatter → identical report
//! - Entries are kept in write order, so the fingerprint also pins the
//!   post-order write sequence, not just the final file set

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// Hash raw bytes.
pub fn content_digest(bytes: &[u8]) -> u64 {
    xxh64(bytes, 0)
}

/// Hash raw bytes and return as hex string.
pub fn content_digest_hex(bytes: &[u8]) -> String {
    format!("{:016x}", content_digest(bytes))
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<u64, serde_json::Error> {
    Ok(content_digest(&serde_json::to_vec(value)?))
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(format!("{:016x}", canonical_hash(value)?))
}

/// One materialized file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenUnit {
    /// Relative path.
    pub path: String,
    /// Size in bytes.
    pub bytes: usize,
    /// xxh64 of the written contents.
    pub digest: String,
}

/// Everything one conversion wrote, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Files in write order.
    pub units: Vec<WrittenUnit>,
}

impl ConversionReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a written file.
    pub fn record(&mut self, path: &str, contents: &str) {
        self.units.push(WrittenUnit {
            path: path.to_string(),
            bytes: contents.len(),
            digest: content_digest_hex(contents.as_bytes()),
        });
    }

    /// Paths in write order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.path.as_str())
    }

    /// Number of files written.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether nothing was written.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Fingerprint over the ordered `(path, digest)` list.
    pub fn fingerprint(&self) -> String {
        let entries: Vec<(&str, &str)> = self
            .units
            .iter()
            .map(|u| (u.path.as_str(), u.digest.as_str()))
            .collect();
        // A list of string pairs always serializes.
        canonical_hash_hex(&entries).unwrap_or_default()
    }
}
