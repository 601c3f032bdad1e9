//! Configuration inspection command

use crate::config::{self, SAMPLER_INTERVAL_RANGE, WATCH_INTERVAL_RANGE};
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

/// Show effective configuration values
pub async fn run_show(config_path: Option<&Path>) -> Result<()> {
    let (config, source) = config::load(config_path)?;
    let paths = config.paths();

    println!("{}", "Configuration".bold());
    match &source {
        Some(path) => println!("{}: {}\n", "Location".dimmed(), path.display().dimmed()),
        None => println!("{}: {}\n", "Location".dimmed(), "defaults (no file)".dimmed()),
    }

    println!(
        "{} = {}",
        "base_dir".cyan(),
        config.base_dir.display()
    );

    println!("\n{}", "[watch]".yellow());
    println!(
        "  {} = {} {}",
        "root".cyan(),
        config.watch.root.display(),
        format!("({})", paths.watch_root.display()).dimmed()
    );
    println!(
        "  {} = {} {}",
        "interval_secs".cyan(),
        config.watch.interval_secs,
        format!("({}s)", config.watch.interval_secs).dimmed()
    );
    println!(
        "  {} = {} {}",
        "log".cyan(),
        config.watch.log.display(),
        format!("({})", paths.events_log.display()).dimmed()
    );

    println!("\n{}", "[sampler]".yellow());
    println!("  {} = {}", "enabled".cyan(), config.sampler.enabled);
    println!(
        "  {} = {} {}",
        "interval_secs".cyan(),
        config.sampler.interval_secs,
        format!("({}s)", config.sampler.interval_secs).dimmed()
    );
    println!(
        "  {} = {} {}",
        "log".cyan(),
        config.sampler.log.display(),
        format!("({})", paths.metrics_log.display()).dimmed()
    );
    println!(
        "  {} = {}",
        "disk_mount".cyan(),
        config.sampler.disk_mount.display()
    );

    println!("\n{}", "[report]".yellow());
    println!(
        "  {} = {} {}",
        "path".cyan(),
        config.report.path.display(),
        format!("({})", paths.report.display()).dimmed()
    );
    println!(
        "  {} = {}",
        "latest_events".cyan(),
        config.report.latest_events
    );

    println!("\n{}", "Valid Ranges:".bold());
    println!(
        "  watch.interval_secs: {}-{}",
        WATCH_INTERVAL_RANGE.start(),
        WATCH_INTERVAL_RANGE.end()
    );
    println!(
        "  sampler.interval_secs: {}-{}",
        SAMPLER_INTERVAL_RANGE.start(),
        SAMPLER_INTERVAL_RANGE.end()
    );

    Ok(())
}

/// Show which config file would be used
pub async fn run_path(config_path: Option<&Path>) -> Result<()> {
    match config::locate(config_path) {
        Some(path) if path.exists() => println!("{}", path.display()),
        Some(path) => {
            println!("{}", path.display());
            println!(
                "{}",
                "File does not exist; defaults apply. Use 'hostwatch config example' for a template."
                    .yellow()
            );
        }
        None => anyhow::bail!("Could not determine config file path"),
    }
    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", config::example_config());
    Ok(())
}
