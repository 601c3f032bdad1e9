//! Run the directory monitor alone

use super::{shutdown_signal, stop_task, task_outcome};
use crate::config;
use crate::locks::MonitorLock;
use anyhow::{Context, Result};
use hostwatch_journal::EventLog;
use hostwatch_watcher::Poller;
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let (config, _) = config::load(config_path)?;
    let paths = config.paths();

    std::fs::create_dir_all(&paths.watch_root).with_context(|| {
        format!(
            "Failed to create watched directory {}",
            paths.watch_root.display()
        )
    })?;

    let lock = MonitorLock::acquire(&paths.events_log)?;
    let mut events = EventLog::new(&paths.events_log);
    events.open().context("Failed to open change-event log")?;

    let poller = Poller::new(&paths.watch_root, config.watch_interval());
    let baseline = poller
        .baseline()
        .await
        .context("Failed to take baseline snapshot")?;

    println!(
        "Watching {} every {}s {}",
        paths.watch_root.display().cyan(),
        config.watch.interval_secs,
        "(Ctrl-C to stop)".dimmed()
    );
    println!("Events: {}", paths.events_log.display());

    let mut task = tokio::spawn(poller.run_from(baseline, events));
    let outcome = tokio::select! {
        res = shutdown_signal() => res,
        res = &mut task => task_outcome("Directory monitor", res),
    };
    stop_task(task).await;

    lock.release()?;
    outcome
}
