//! Polling loop errors

use hostwatch_core::ScanError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the polling loop.
///
/// A failed enumeration in the middle of a run is not one of these; the
/// cycle is skipped and retried.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("baseline snapshot of {} failed", root.display())]
    Baseline {
        root: PathBuf,
        #[source]
        source: ScanError,
    },

    #[error("event sink rejected an event")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("snapshot task did not complete")]
    Join(#[from] tokio::task::JoinError),
}
