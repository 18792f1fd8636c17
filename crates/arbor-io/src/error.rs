//! I/O error types.

use std::path::PathBuf;

/// Errors from the file backend and the atomic writer.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Underlying OS I/O error, with the operation and path that failed.
    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File not found.
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The target path has no file name component.
    #[error("not a file path: {}", path.display())]
    NoFileName { path: PathBuf },

    /// The new contents could not be moved into place; the original was restored.
    #[error("could not replace {}: {source}", path.display())]
    FinalMove {
        path: PathBuf,
        #[source]
        source: Box<IoError>,
    },

    /// The new contents could not be moved into place and the backup could not be restored.
    #[error(
        "could not replace {} and restoring backup {} failed: {restore}",
        path.display(),
        backup.display()
    )]
    RestoreFailed {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: Box<IoError>,
        restore: Box<IoError>,
    },
}

impl IoError {
    /// Wraps an OS error, mapping `NotFound` to its own variant.
    pub fn from_io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return IoError::NotFound { path };
        }
        IoError::Io { op, path, source }
    }

    /// True when a rename failed because source and target are on different devices.
    pub fn is_cross_device(&self) -> bool {
        matches!(
            self,
            IoError::Io { source, .. } if source.kind() == std::io::ErrorKind::CrossesDevices
        )
    }
}
