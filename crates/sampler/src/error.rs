//! Sampler errors

use hostwatch_journal::LogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("failed to record sample")]
    Log(#[from] LogError),

    #[error("sampling task did not complete")]
    Join(#[from] tokio::task::JoinError),
}
