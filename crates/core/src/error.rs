//! Errors raised while enumerating the watched root

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The watched root could not be enumerated at all.
///
/// Per-entry failures never show up here; they are dropped from the snapshot
/// instead. This error means the whole cycle has nothing trustworthy to diff.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("watched root does not exist: {}", path.display())]
    RootMissing { path: PathBuf },

    #[error("watched root is not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("watched root is unreadable: {}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Path of the root that failed
    pub fn path(&self) -> &PathBuf {
        match self {
            ScanError::RootMissing { path }
            | ScanError::NotADirectory { path }
            | ScanError::RootUnreadable { path, .. } => path,
        }
    }

    pub(crate) fn from_root_io(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ScanError::RootMissing { path }
        } else {
            ScanError::RootUnreadable { path, source }
        }
    }
}
