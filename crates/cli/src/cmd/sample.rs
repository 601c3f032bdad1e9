//! Run the resource sampler alone, or take one sample

use super::{shutdown_signal, stop_task, task_outcome};
use crate::config;
use crate::locks::MonitorLock;
use anyhow::{Context, Result};
use hostwatch_journal::{MetricsLog, MetricsSample};
use hostwatch_sampler::Sampler;
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(config_path: Option<&Path>, once: bool) -> Result<()> {
    let (config, _) = config::load(config_path)?;
    let sampler = Sampler::new(&config.sampler.disk_mount, config.sampler_interval());

    if once {
        let sample = sampler.sample_once().await.context("Failed to sample")?;
        print_sample(&sample, &config.sampler.disk_mount);
        return Ok(());
    }

    let paths = config.paths();
    let lock = MonitorLock::acquire(&paths.metrics_log)?;
    let mut metrics = MetricsLog::new(&paths.metrics_log);
    metrics.open().context("Failed to open metrics log")?;

    println!(
        "Sampling every {}s to {} {}",
        config.sampler.interval_secs,
        paths.metrics_log.display().cyan(),
        "(Ctrl-C to stop)".dimmed()
    );

    let mut task = tokio::spawn(sampler.run(metrics));
    let outcome = tokio::select! {
        res = shutdown_signal() => res,
        res = &mut task => task_outcome("Resource sampler", res),
    };
    stop_task(task).await;

    lock.release()?;
    outcome
}

fn print_sample(sample: &MetricsSample, disk_mount: &Path) {
    println!("{}", "Resource Sample".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Time:       {}", sample.timestamp);
    println!(
        "CPU:        {:.2}% {}",
        sample.cpu_usage_pct,
        format!(
            "(load {:.2}, {:.2}, {:.2})",
            sample.load_avg_1m, sample.load_avg_5m, sample.load_avg_15m
        )
        .dimmed()
    );
    println!(
        "Memory:     {:.2}% {}",
        sample.mem_usage_pct,
        format!(
            "({:.0} of {:.0} MB used, {:.0} MB available)",
            sample.mem_used_mb, sample.mem_total_mb, sample.mem_avail_mb
        )
        .dimmed()
    );
    println!(
        "Disk:       {:.2}% {}",
        sample.disk_usage_pct,
        format!(
            "({:.2} of {:.2} GB used on {})",
            sample.disk_used_gb,
            sample.disk_total_gb,
            disk_mount.display()
        )
        .dimmed()
    );
    println!(
        "Processes:  {} total, {} running, {} sleeping",
        sample.proc_total, sample.proc_running, sample.proc_sleeping
    );
    println!("Uptime:     {:.0}s", sample.uptime_sec);
    println!();

    println!("{}", "Top CPU".yellow());
    for entry in [&sample.top_cpu_1, &sample.top_cpu_2, &sample.top_cpu_3] {
        if !entry.is_empty() {
            println!("  {}", entry);
        }
    }
    println!("{}", "Top Memory".yellow());
    for entry in [&sample.top_mem_1, &sample.top_mem_2, &sample.top_mem_3] {
        if !entry.is_empty() {
            println!("  {}", entry);
        }
    }
}
