//! File backend trait.
//!
//! The [`FileBackend`] trait abstracts the handful of whole-file operations
//! the host needs to read and persist documents. The atomic writer is built
//! on top of it, so its backup and rollback sequence can be tested with
//! backends that fail at chosen steps.

use std::path::Path;
use std::sync::Arc;

use crate::IoError;

/// Whole-file operations used by the persistence layer.
pub trait FileBackend: Send + Sync {
    /// Reads an entire file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> Result<String, IoError>;

    /// Creates or truncates `path` and writes `data`, then syncs it to disk.
    fn write_all(&self, path: &Path, data: &[u8]) -> Result<(), IoError>;

    /// Renames a file. Fails with a cross-device error when `from` and `to`
    /// are on different file systems.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), IoError>;

    /// Copies a file's contents.
    fn copy(&self, from: &Path, to: &Path) -> Result<(), IoError>;

    /// Deletes a file.
    fn remove(&self, path: &Path) -> Result<(), IoError>;

    fn exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> Result<(), IoError>;
}

impl<B: FileBackend + ?Sized> FileBackend for Arc<B> {
    fn read_to_string(&self, path: &Path) -> Result<String, IoError> {
        (**self).read_to_string(path)
    }

    fn write_all(&self, path: &Path, data: &[u8]) -> Result<(), IoError> {
        (**self).write_all(path, data)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), IoError> {
        (**self).rename(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<(), IoError> {
        (**self).copy(from, to)
    }

    fn remove(&self, path: &Path) -> Result<(), IoError> {
        (**self).remove(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), IoError> {
        (**self).create_dir_all(path)
    }
}
