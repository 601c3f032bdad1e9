//! Log sink errors
//!
//! All of these are fatal for the caller. A log that silently drops records
//! is worse than a monitor that stops.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot create log directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open {} for append", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} has header `{found}`, expected `{expected}`", path.display())]
    SchemaMismatch {
        path: PathBuf,
        found: String,
        expected: String,
    },

    #[error("failed to write record to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write report {}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
