//! Plain-text final report
//!
//! Built from the two logs as they are on disk. Both are read tolerantly:
//! a missing log is an empty one, a missing cell renders as `?`, and a
//! numeric cell that does not parse counts as zero.

use crate::csv_log::{read_rows, Row};
use crate::error::LogError;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use tracing::info;

const TITLE: &str = "hostwatch - Final Report";

/// Locations of the inputs and the output of a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub events_log: PathBuf,
    pub metrics_log: PathBuf,
    pub report: PathBuf,
}

/// Directory-monitoring half of the report
#[derive(Debug, Clone, Default)]
pub struct DirectorySummary {
    pub total: usize,
    pub created: usize,
    pub deleted: usize,
    pub modified: usize,
    /// Most recent events, oldest first
    pub latest: Vec<Row>,
}

/// Resource-sampling half of the report
#[derive(Debug, Clone, Default)]
pub struct SystemSummary {
    pub samples: usize,
    pub avg_cpu_pct: f64,
    pub avg_mem_pct: f64,
    pub avg_disk_pct: f64,
    pub latest: Option<Row>,
}

/// Summary of both logs, ready to render
#[derive(Debug, Clone)]
pub struct Report {
    pub generated_at: DateTime<Local>,
    pub paths: ReportPaths,
    pub directory: DirectorySummary,
    pub system: SystemSummary,
}

impl Report {
    /// Summarize already-read rows
    pub fn from_rows(
        paths: ReportPaths,
        event_rows: Vec<Row>,
        metric_rows: Vec<Row>,
        latest_events: usize,
        generated_at: DateTime<Local>,
    ) -> Self {
        let count = |kind: &str| {
            event_rows
                .iter()
                .filter(|r| r.get("event").map(String::as_str) == Some(kind))
                .count()
        };
        let directory = DirectorySummary {
            total: event_rows.len(),
            created: count("CREATED"),
            deleted: count("DELETED"),
            modified: count("MODIFIED"),
            latest: event_rows[event_rows.len().saturating_sub(latest_events)..].to_vec(),
        };

        let system = SystemSummary {
            samples: metric_rows.len(),
            avg_cpu_pct: column_average(&metric_rows, "CPU_Usage_Pct"),
            avg_mem_pct: column_average(&metric_rows, "Mem_Usage_Pct"),
            avg_disk_pct: column_average(&metric_rows, "Disk_Usage_Pct"),
            latest: metric_rows.last().cloned(),
        };

        Self {
            generated_at,
            paths,
            directory,
            system,
        }
    }

    /// Read both logs and summarize them
    pub fn load(paths: ReportPaths, latest_events: usize) -> Result<Self, LogError> {
        let event_rows = read_rows(&paths.events_log)?;
        let metric_rows = read_rows(&paths.metrics_log)?;
        Ok(Self::from_rows(
            paths,
            event_rows,
            metric_rows,
            latest_events,
            Local::now(),
        ))
    }

    /// Render the report text
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "{TITLE}")?;
        writeln!(out, "{}", "=".repeat(TITLE.len()))?;
        writeln!(
            out,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(out)?;

        let dir = &self.directory;
        heading(out, "1) Directory Monitoring Summary")?;
        writeln!(out, "Total directory events: {}", dir.total)?;
        writeln!(out, "CREATED:  {}", dir.created)?;
        writeln!(out, "DELETED:  {}", dir.deleted)?;
        writeln!(out, "MODIFIED: {}", dir.modified)?;
        writeln!(out)?;

        if !dir.latest.is_empty() {
            writeln!(out, "Latest {} directory events:", dir.latest.len())?;
            for row in &dir.latest {
                writeln!(
                    out,
                    "- {} | {} | type {} | size {} | perms {} | owner {}",
                    cell(row, "event"),
                    cell(row, "name"),
                    cell(row, "ftype"),
                    cell(row, "size"),
                    cell(row, "perms"),
                    cell(row, "owner"),
                )?;
            }
            writeln!(out)?;
        }

        let sys = &self.system;
        heading(out, "2) System Performance Summary")?;
        writeln!(out, "Total system samples: {}", sys.samples)?;
        writeln!(out, "Average CPU usage:  {:.2}%", sys.avg_cpu_pct)?;
        writeln!(out, "Average MEM usage:  {:.2}%", sys.avg_mem_pct)?;
        writeln!(out, "Average DISK usage: {:.2}%", sys.avg_disk_pct)?;
        writeln!(out)?;

        if let Some(last) = &sys.latest {
            let c = |key: &'static str| cell(last, key);
            writeln!(out, "Latest system sample:")?;
            writeln!(out, "- Timestamp: {}", c("Timestamp"))?;
            writeln!(
                out,
                "- CPU: {}% | LoadAvg: {},{},{}",
                c("CPU_Usage_Pct"),
                c("LoadAvg_1m"),
                c("LoadAvg_5m"),
                c("LoadAvg_15m")
            )?;
            writeln!(
                out,
                "- MEM: {}% | DISK: {}%",
                c("Mem_Usage_Pct"),
                c("Disk_Usage_Pct")
            )?;
            writeln!(
                out,
                "- Processes: total {} | running {} | sleeping {}",
                c("Proc_Total"),
                c("Proc_Running"),
                c("Proc_Sleeping")
            )?;
            writeln!(
                out,
                "- Top CPU: {}, {}, {}",
                c("TopCPU_1"),
                c("TopCPU_2"),
                c("TopCPU_3")
            )?;
            writeln!(
                out,
                "- Top MEM: {}, {}, {}",
                c("TopMem_1"),
                c("TopMem_2"),
                c("TopMem_3")
            )?;
            writeln!(out)?;
        }

        heading(out, "3) Files Generated")?;
        writeln!(out, "- Directory log CSV: {}", self.paths.events_log.display())?;
        writeln!(out, "- System log CSV:    {}", self.paths.metrics_log.display())?;
        writeln!(out, "- Final report TXT:  {}", self.paths.report.display())?;

        Ok(())
    }

    /// Write the rendered report, creating the parent directory
    pub fn write(&self) -> Result<(), LogError> {
        let path = &self.paths.report;
        let report_err = |source: std::io::Error| LogError::Report {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(report_err)?;
        }
        fs::write(path, self.render()).map_err(report_err)
    }
}

fn heading(out: &mut String, title: &str) -> std::fmt::Result {
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "-".repeat(title.len()))
}

fn cell<'a>(row: &'a Row, key: &str) -> &'a str {
    row.get(key).map(String::as_str).unwrap_or("?")
}

/// Mean of the non-empty cells of `column`; unparsable cells count as zero
fn column_average(rows: &[Row], column: &str) -> f64 {
    let values: Vec<f64> = rows
        .iter()
        .filter_map(|r| r.get(column))
        .filter(|v| !v.is_empty())
        .map(|v| v.trim().parse::<f64>().unwrap_or(0.0))
        .collect();

    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Summarize both logs and write the report file
pub fn generate_report(paths: &ReportPaths, latest_events: usize) -> Result<Report, LogError> {
    let report = Report::load(paths.clone(), latest_events)?;
    report.write()?;

    info!(
        "Report written to {} ({} events, {} samples)",
        report.paths.report.display(),
        report.directory.total,
        report.system.samples
    );
    Ok(report)
}
