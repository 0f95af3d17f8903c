//! Unit storage backends.

pub mod memory;
pub mod fs;

/// Trait for unit storage backends.
///
/// Paths are relative and `/`-separated, exactly as they appear in import
/// statements. `put` must not return before the contents are stored: the
/// converter relies on that to write children before their parents.
pub trait UnitStore {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store `contents` at `path`, replacing any previous contents.
    fn put(&mut self, path: &str, contents: &str) -> Result<(), Self::Error>;

    /// Whether something has been stored at `path`.
    fn contains(&self, path: &str) -> bool;
}

impl<S: UnitStore + ?Sized> UnitStore for &mut S {
    type Error = S::Error;

    fn put(&mut self, path: &str, contents: &str) -> Result<(), Self::Error> {
        (**self).put(path, contents)
    }

    fn contains(&self, path: &str) -> bool {
        (**self).contains(path)
    }
}

pub use memory::InMemoryUnitStore;
pub use fs::{FsUnitStore, FsStoreError};
