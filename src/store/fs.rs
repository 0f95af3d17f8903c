//! Filesystem unit store.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use super::UnitStore;

/// Error type for filesystem store.
#[derive(Debug, thiserror::Error)]
pub enum FsStoreError {
    /// Path would leave the output root.
    #[error("Unit path escapes output directory: {0:?}")]
    OutsideRoot(String),
    /// Underlying I/O failure.
    #[error("Failed to write {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Cause.
        #[source]
        source: std::io::Error,
    },
}

/// Writes units below a root directory.
#[derive(Debug, Clone)]
pub struct FsUnitStore {
    root: PathBuf,
}

impl FsUnitStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a unit path.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, FsStoreError> {
        let relative = Path::new(path);
        let confined = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !confined {
            return Err(FsStoreError::OutsideRoot(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl UnitStore for FsUnitStore {
    type Error = FsStoreError;

    fn put(&mut self, path: &str, contents: &str) -> Result<(), Self::Error> {
        let target = self.resolve(path)?;
        let io_err = |source| FsStoreError::Io { path: target.clone(), source };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut file = fs::File::create(&target).map_err(io_err)?;
        file.write_all(contents.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        tracing::info!(path = %target.display(), bytes = contents.len(), "wrote unit");
        Ok(())
    }

    fn contains(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }
}
