//! Atomic replacement of a file with a rotating backup.
//!
//! Writing `path` proceeds as:
//!
//! 1. write the new contents to a temp file in the scratch directory
//! 2. delete any previous backup (`<name><suffix>`, `.bak` by default)
//! 3. rename the current file, if any, to the backup
//! 4. move the temp file to `path`
//!
//! If step 4 fails the backup is renamed back, so `path` still holds the
//! original contents. A rename across file systems falls back to copying
//! into a staging file next to `path` and renaming that.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::IoError;
use crate::backend::FileBackend;
use crate::std_backend::StdBackend;

/// Default suffix appended to the file name of the backup copy.
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replaces files through a temp-file, backup, move sequence.
#[derive(Debug)]
pub struct AtomicWriter<B = StdBackend> {
    backend: B,
    scratch_dir: PathBuf,
    backup_suffix: String,
}

impl AtomicWriter<StdBackend> {
    /// Creates a writer over the local file system.
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self::with_backend(StdBackend, scratch_dir)
    }
}

impl<B: FileBackend> AtomicWriter<B> {
    pub fn with_backend(backend: B, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            scratch_dir: scratch_dir.into(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }

    pub fn backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Path of the backup kept for `path`.
    pub fn backup_path(&self, path: &Path) -> Result<PathBuf, IoError> {
        let name = file_name(path)?;
        Ok(path.with_file_name(format!("{name}{}", self.backup_suffix)))
    }

    /// Replaces `path` with `contents`, keeping the previous file as a backup.
    pub fn write(&self, path: &Path, contents: &[u8]) -> Result<(), IoError> {
        let name = file_name(path)?;
        let backup = self.backup_path(path)?;

        self.backend.create_dir_all(&self.scratch_dir)?;
        let temp = self.scratch_dir.join(format!(
            "{name}.{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        self.backend.write_all(&temp, contents)?;

        if let Err(e) = self.rotate_backup(path, &backup) {
            self.discard(&temp);
            return Err(e);
        }
        let had_original = self.backend.exists(&backup);

        if let Err(move_error) = self.move_into_place(&temp, path, &name) {
            self.discard(&temp);
            if !had_original {
                return Err(move_error);
            }
            tracing::warn!(
                path = %path.display(),
                error = %move_error,
                "final move failed, restoring backup"
            );
            return match self.backend.rename(&backup, path) {
                Ok(()) => Err(IoError::FinalMove {
                    path: path.to_path_buf(),
                    source: Box::new(move_error),
                }),
                Err(restore) => Err(IoError::RestoreFailed {
                    path: path.to_path_buf(),
                    backup,
                    source: Box::new(move_error),
                    restore: Box::new(restore),
                }),
            };
        }

        tracing::info!(path = %path.display(), bytes = contents.len(), "wrote file");
        Ok(())
    }

    fn rotate_backup(&self, path: &Path, backup: &Path) -> Result<(), IoError> {
        if self.backend.exists(backup) {
            self.backend.remove(backup)?;
        }
        if self.backend.exists(path) {
            self.backend.rename(path, backup)?;
        }
        Ok(())
    }

    fn move_into_place(&self, temp: &Path, path: &Path, name: &str) -> Result<(), IoError> {
        match self.backend.rename(temp, path) {
            Err(e) if e.is_cross_device() => {
                tracing::debug!(temp = %temp.display(), "cross-device rename, copying instead");
                let staging = path.with_file_name(format!(".{name}.staging"));
                self.backend.copy(temp, &staging)?;
                self.discard(temp);
                self.backend.rename(&staging, path).inspect_err(|_| {
                    self.discard(&staging);
                })
            }
            other => other,
        }
    }

    fn discard(&self, path: &Path) {
        if self.backend.exists(path)
            && let Err(e) = self.backend.remove(path)
        {
            tracing::warn!(path = %path.display(), error = %e, "could not remove temp file");
        }
    }
}

fn file_name(path: &Path) -> Result<String, IoError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| IoError::NoFileName {
            path: path.to_path_buf(),
        })
}
