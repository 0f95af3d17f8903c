//! In-memory unit store for testing.

use std::collections::BTreeMap;

use super::UnitStore;

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// Path was empty or absolute.
    #[error("Invalid unit path: {0:?}")]
    InvalidPath(String),
}

/// In-memory unit store.
///
/// Keeps every unit by path plus the order in which paths were written.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUnitStore {
    /// Unit contents by path.
    units: BTreeMap<String, String>,
    /// Paths in write order (repeats included).
    writes: Vec<String>,
}

impl InMemoryUnitStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents stored at `path`.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.units.get(path).map(String::as_str)
    }

    /// Paths in the order they were written.
    pub fn write_order(&self) -> &[String] {
        &self.writes
    }

    /// Position of the first write of `path`.
    pub fn written_at(&self, path: &str) -> Option<usize> {
        self.writes.iter().position(|p| p == path)
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        self.units.keys().map(String::as_str).collect()
    }

    /// Number of distinct stored paths.
    pub fn num_units(&self) -> usize {
        self.units.len()
    }
}

impl UnitStore for InMemoryUnitStore {
    type Error = InMemoryError;

    fn put(&mut self, path: &str, contents: &str) -> Result<(), Self::Error> {
        if path.is_empty() || path.starts_with('/') {
            return Err(InMemoryError::InvalidPath(path.to_string()));
        }
        self.units.insert(path.to_string(), contents.to_string());
        self.writes.push(path.to_string());
        Ok(())
    }

    fn contains(&self, path: &str) -> bool {
        self.units.contains_key(path)
    }
}
