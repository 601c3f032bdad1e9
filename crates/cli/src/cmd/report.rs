//! Write the report from existing logs

use crate::config;
use anyhow::{Context, Result};
use hostwatch_journal::generate_report;
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let (config, _) = config::load(config_path)?;
    let paths = config.paths().report_paths();

    let report = generate_report(&paths, config.report.latest_events)
        .context("Failed to generate report")?;

    println!(
        "{} Report generated at: {}",
        "✓".green(),
        report.paths.report.display()
    );
    println!(
        "  {} directory events, {} system samples",
        report.directory.total, report.system.samples
    );
    Ok(())
}
