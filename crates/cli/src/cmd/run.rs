//! Run both monitors until Ctrl-C, then write the report

use super::{shutdown_signal, stop_task, task_outcome, wait_optional};
use crate::config;
use crate::locks::MonitorLock;
use anyhow::{Context, Result};
use hostwatch_journal::{generate_report, EventLog, MetricsLog};
use hostwatch_sampler::Sampler;
use hostwatch_watcher::Poller;
use owo_colors::OwoColorize;
use std::path::Path;
use tracing::{debug, error, info};

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    // 1. Load configuration
    let (config, source) = config::load(config_path)?;
    let paths = config.paths();
    if let Some(source) = &source {
        info!("Using config {}", source.display());
    }

    // 2. Watched root must exist before the baseline
    std::fs::create_dir_all(&paths.watch_root).with_context(|| {
        format!(
            "Failed to create watched directory {}",
            paths.watch_root.display()
        )
    })?;

    // 3. Lock and open the logs up front so bad paths fail at startup
    let events_lock = MonitorLock::acquire(&paths.events_log)?;
    debug!("Holding {}", events_lock.path().display());
    let mut events = EventLog::new(&paths.events_log);
    events.open().context("Failed to open change-event log")?;

    let mut sampling = None;
    if config.sampler.enabled {
        let lock = MonitorLock::acquire(&paths.metrics_log)?;
        let mut metrics = MetricsLog::new(&paths.metrics_log);
        metrics.open().context("Failed to open metrics log")?;
        sampling = Some((lock, metrics));
    }

    // 4. Baseline
    let poller = Poller::new(&paths.watch_root, config.watch_interval());
    let baseline = poller
        .baseline()
        .await
        .context("Failed to take baseline snapshot")?;

    println!("{}", "=== hostwatch ===".bold());
    println!("Monitored directory : {}", paths.watch_root.display().cyan());
    println!("Directory log       : {}", paths.events_log.display());
    if config.sampler.enabled {
        println!("System log          : {}", paths.metrics_log.display());
    } else {
        println!("System log          : {}", "disabled".dimmed());
    }
    println!(
        "{}",
        "Create / modify / delete files in the monitored directory".dimmed()
    );
    println!("{}\n", "Press Ctrl-C to stop and generate the report".dimmed());

    // 5. Start both tasks
    let mut watch_task = tokio::spawn(poller.run_from(baseline, events));
    let (metrics_lock, mut sample_task) = match sampling {
        Some((lock, metrics)) => {
            let sampler = Sampler::new(&config.sampler.disk_mount, config.sampler_interval());
            (Some(lock), Some(tokio::spawn(sampler.run(metrics))))
        }
        None => (None, None),
    };

    // 6. Run until Ctrl-C or a fatal task error
    let outcome = tokio::select! {
        res = shutdown_signal() => res,
        res = &mut watch_task => task_outcome("Directory monitor", res),
        res = wait_optional(&mut sample_task) => task_outcome("Resource sampler", res),
    };
    // Nothing may still be appending once the report reads the logs
    stop_task(watch_task).await;
    if let Some(task) = sample_task {
        stop_task(task).await;
    }

    // 7. Report covers whatever was logged, even after a failure
    match generate_report(&paths.report_paths(), config.report.latest_events) {
        Ok(report) => println!(
            "{} Report generated at: {}",
            "✓".green(),
            report.paths.report.display()
        ),
        Err(e) => {
            error!("Report generation failed: {}", e);
            if outcome.is_ok() {
                return Err(e).context("Failed to write report");
            }
        }
    }

    events_lock.release()?;
    if let Some(lock) = metrics_lock {
        lock.release()?;
    }

    outcome
}
