//! File backend using `std::fs`.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::IoError;
use crate::backend::FileBackend;

/// Blocking backend over the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdBackend;

impl StdBackend {
    pub fn new() -> Self {
        Self
    }
}

impl FileBackend for StdBackend {
    fn read_to_string(&self, path: &Path) -> Result<String, IoError> {
        fs::read_to_string(path).map_err(|e| IoError::from_io("read", path, e))
    }

    fn write_all(&self, path: &Path, data: &[u8]) -> Result<(), IoError> {
        let mut file = File::create(path).map_err(|e| IoError::from_io("create", path, e))?;
        file.write_all(data)
            .map_err(|e| IoError::from_io("write", path, e))?;
        file.sync_all()
            .map_err(|e| IoError::from_io("sync", path, e))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), IoError> {
        fs::rename(from, to).map_err(|e| IoError::from_io("rename", from, e))
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<(), IoError> {
        fs::copy(from, to)
            .map(|_| ())
            .map_err(|e| IoError::from_io("copy", from, e))
    }

    fn remove(&self, path: &Path) -> Result<(), IoError> {
        fs::remove_file(path).map_err(|e| IoError::from_io("remove", path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), IoError> {
        fs::create_dir_all(path).map_err(|e| IoError::from_io("create directory", path, e))
    }
}
