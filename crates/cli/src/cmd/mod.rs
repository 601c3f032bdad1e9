//! CLI command implementations

pub mod config;
pub mod report;
pub mod run;
pub mod sample;
pub mod watch;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use tokio::task::{JoinError, JoinHandle};
use tracing::warn;

/// Wait for Ctrl-C
pub(crate) async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    println!("\n{}", "Stopping monitors...".yellow());
    Ok(())
}

/// Await an optional background task; never completes when there is none
pub(crate) async fn wait_optional<T>(task: &mut Option<JoinHandle<T>>) -> Result<T, JoinError> {
    match task {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Cancel a background task and wait until it has actually stopped.
///
/// Cancellation lands at the task's next `.await`, so an append in progress
/// finishes first. A handle already awaited to completion is left alone.
pub(crate) async fn stop_task<T>(task: JoinHandle<T>) {
    if task.is_finished() {
        return;
    }
    task.abort();
    if let Err(e) = task.await {
        if !e.is_cancelled() {
            warn!("Background task ended abnormally: {}", e);
        }
    }
}

/// Turn a finished background task into the command's result.
///
/// These tasks only finish on their own when something went wrong.
pub(crate) fn task_outcome<E>(name: &str, finished: Result<Result<(), E>, JoinError>) -> Result<()>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match finished {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e).with_context(|| format!("{} stopped", name)),
        Err(e) => Err(e).with_context(|| format!("{} task failed", name)),
    }
}
