//! One resource sample
//!
//! Figures come from `sysinfo`. CPU percentages need two refreshes spaced by
//! `MINIMUM_CPU_UPDATE_INTERVAL`, so taking a sample blocks for at least
//! that long; callers on an async runtime should use the blocking pool.

use chrono::Local;
use hostwatch_journal::MetricsSample;
use std::path::{Path, PathBuf};
use sysinfo::{Disks, ProcessStatus, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::debug;

const MB: f64 = 1024.0 * 1024.0;
const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Timestamp format of the metrics log
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Number of processes listed per ranking
pub const TOP_N: usize = 3;

/// Process counts by scheduler state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessCounts {
    pub total: u64,
    pub running: u64,
    /// Sleeping, including uninterruptible disk sleep
    pub sleeping: u64,
}

impl ProcessCounts {
    pub fn tally<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = ProcessStatus>,
    {
        let mut counts = Self::default();
        for status in statuses {
            counts.total += 1;
            match status {
                ProcessStatus::Run => counts.running += 1,
                ProcessStatus::Sleep | ProcessStatus::UninterruptibleDiskSleep => {
                    counts.sleeping += 1
                }
                _ => {}
            }
        }
        counts
    }
}

/// Per-process load used for the top-N rankings
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessLoad {
    pub name: String,
    pub pid: u32,
    pub cpu_pct: f32,
    pub mem_pct: f64,
}

/// Top processes by CPU, rendered as `name(pid):x.x%` and padded to `TOP_N`
pub fn top_by_cpu(loads: &[ProcessLoad]) -> [String; TOP_N] {
    let mut ranked: Vec<&ProcessLoad> = loads.iter().collect();
    ranked.sort_by(|a, b| b.cpu_pct.total_cmp(&a.cpu_pct));
    padded(
        ranked
            .iter()
            .map(|p| format!("{}({}):{:.1}%", p.name, p.pid, p.cpu_pct)),
    )
}

/// Top processes by memory, rendered as `name(pid):x.xx%` and padded to `TOP_N`
pub fn top_by_memory(loads: &[ProcessLoad]) -> [String; TOP_N] {
    let mut ranked: Vec<&ProcessLoad> = loads.iter().collect();
    ranked.sort_by(|a, b| b.mem_pct.total_cmp(&a.mem_pct));
    padded(
        ranked
            .iter()
            .map(|p| format!("{}({}):{:.2}%", p.name, p.pid, p.mem_pct)),
    )
}

fn padded(entries: impl Iterator<Item = String>) -> [String; TOP_N] {
    let mut out: [String; TOP_N] = Default::default();
    for (slot, entry) in out.iter_mut().zip(entries) {
        *slot = entry;
    }
    out
}

/// Usage of one mounted filesystem
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiskFigures {
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub usage_pct: f64,
}

impl DiskFigures {
    pub fn from_bytes(total: u64, available: u64) -> Self {
        let used = total.saturating_sub(available);
        Self {
            total_gb: total as f64 / GB,
            used_gb: used as f64 / GB,
            free_gb: available as f64 / GB,
            usage_pct: percent(used as f64, total as f64),
        }
    }
}

/// `part` as a percentage of `whole`; zero when `whole` is zero
pub fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Stateful collector; keeps its `System` between samples
pub struct Collector {
    system: System,
    disk_mount: PathBuf,
}

impl Collector {
    pub fn new(disk_mount: impl Into<PathBuf>) -> Self {
        Self {
            system: System::new_all(),
            disk_mount: disk_mount.into(),
        }
    }

    pub fn disk_mount(&self) -> &Path {
        &self.disk_mount
    }

    /// Take one sample. Blocks for `MINIMUM_CPU_UPDATE_INTERVAL`.
    pub fn sample(&mut self) -> MetricsSample {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

        // 1. Two refreshes so CPU usage has a measurement window
        self.system.refresh_all();
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        self.system.refresh_all();

        // 2. Processes
        let total_memory = self.system.total_memory();
        let processes = self.system.processes();
        let counts = ProcessCounts::tally(processes.values().map(|p| p.status()));
        let loads: Vec<ProcessLoad> = processes
            .iter()
            .map(|(pid, process)| ProcessLoad {
                name: process.name().to_string_lossy().into_owned(),
                pid: pid.as_u32(),
                cpu_pct: process.cpu_usage(),
                mem_pct: percent(process.memory() as f64, total_memory as f64),
            })
            .collect();
        let [top_cpu_1, top_cpu_2, top_cpu_3] = top_by_cpu(&loads);
        let [top_mem_1, top_mem_2, top_mem_3] = top_by_memory(&loads);

        // 3. Memory, disk, load
        let available_memory = self.system.available_memory();
        let used_memory = self.system.used_memory();
        let disk = self.disk_figures();
        let load = System::load_average();

        MetricsSample {
            timestamp,
            cpu_usage_pct: self.system.global_cpu_usage() as f64,
            load_avg_1m: load.one,
            load_avg_5m: load.five,
            load_avg_15m: load.fifteen,
            proc_total: counts.total,
            proc_running: counts.running,
            proc_sleeping: counts.sleeping,
            mem_total_mb: total_memory as f64 / MB,
            mem_used_mb: used_memory as f64 / MB,
            mem_avail_mb: available_memory as f64 / MB,
            mem_usage_pct: percent(
                total_memory.saturating_sub(available_memory) as f64,
                total_memory as f64,
            ),
            disk_total_gb: disk.total_gb,
            disk_used_gb: disk.used_gb,
            disk_free_gb: disk.free_gb,
            disk_usage_pct: disk.usage_pct,
            uptime_sec: System::uptime() as f64,
            top_cpu_1,
            top_cpu_2,
            top_cpu_3,
            top_mem_1,
            top_mem_2,
            top_mem_3,
        }
    }

    fn disk_figures(&self) -> DiskFigures {
        let disks = Disks::new_with_refreshed_list();
        match disks
            .iter()
            .find(|d| d.mount_point() == self.disk_mount.as_path())
        {
            Some(disk) => DiskFigures::from_bytes(disk.total_space(), disk.available_space()),
            None => {
                debug!(
                    "No disk mounted at {}, reporting zero disk usage",
                    self.disk_mount.display()
                );
                DiskFigures::default()
            }
        }
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("disk_mount", &self.disk_mount)
            .finish()
    }
}
