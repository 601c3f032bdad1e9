//! Resource-metrics log

use crate::csv_log::CsvLog;
use crate::error::LogError;
use serde::{Deserialize, Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Columns of the metrics log, in file order
pub const METRICS_COLUMNS: &[&str] = &[
    "Timestamp",
    "CPU_Usage_Pct",
    "LoadAvg_1m",
    "LoadAvg_5m",
    "LoadAvg_15m",
    "Proc_Total",
    "Proc_Running",
    "Proc_Sleeping",
    "Mem_Total_MB",
    "Mem_Used_MB",
    "Mem_Avail_MB",
    "Mem_Usage_Pct",
    "Disk_Total_GB",
    "Disk_Used_GB",
    "Disk_Free_GB",
    "Disk_Usage_Pct",
    "Uptime_Sec",
    "TopCPU_1",
    "TopCPU_2",
    "TopCPU_3",
    "TopMem_1",
    "TopMem_2",
    "TopMem_3",
];

/// One resource sample. Field order must match `METRICS_COLUMNS`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "CPU_Usage_Pct", serialize_with = "two_decimals")]
    pub cpu_usage_pct: f64,
    #[serde(rename = "LoadAvg_1m", serialize_with = "two_decimals")]
    pub load_avg_1m: f64,
    #[serde(rename = "LoadAvg_5m", serialize_with = "two_decimals")]
    pub load_avg_5m: f64,
    #[serde(rename = "LoadAvg_15m", serialize_with = "two_decimals")]
    pub load_avg_15m: f64,
    #[serde(rename = "Proc_Total")]
    pub proc_total: u64,
    #[serde(rename = "Proc_Running")]
    pub proc_running: u64,
    #[serde(rename = "Proc_Sleeping")]
    pub proc_sleeping: u64,
    #[serde(rename = "Mem_Total_MB", serialize_with = "two_decimals")]
    pub mem_total_mb: f64,
    #[serde(rename = "Mem_Used_MB", serialize_with = "two_decimals")]
    pub mem_used_mb: f64,
    #[serde(rename = "Mem_Avail_MB", serialize_with = "two_decimals")]
    pub mem_avail_mb: f64,
    #[serde(rename = "Mem_Usage_Pct", serialize_with = "two_decimals")]
    pub mem_usage_pct: f64,
    #[serde(rename = "Disk_Total_GB", serialize_with = "two_decimals")]
    pub disk_total_gb: f64,
    #[serde(rename = "Disk_Used_GB", serialize_with = "two_decimals")]
    pub disk_used_gb: f64,
    #[serde(rename = "Disk_Free_GB", serialize_with = "two_decimals")]
    pub disk_free_gb: f64,
    #[serde(rename = "Disk_Usage_Pct", serialize_with = "two_decimals")]
    pub disk_usage_pct: f64,
    #[serde(rename = "Uptime_Sec", serialize_with = "two_decimals")]
    pub uptime_sec: f64,
    #[serde(rename = "TopCPU_1")]
    pub top_cpu_1: String,
    #[serde(rename = "TopCPU_2")]
    pub top_cpu_2: String,
    #[serde(rename = "TopCPU_3")]
    pub top_cpu_3: String,
    #[serde(rename = "TopMem_1")]
    pub top_mem_1: String,
    #[serde(rename = "TopMem_2")]
    pub top_mem_2: String,
    #[serde(rename = "TopMem_3")]
    pub top_mem_3: String,
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", value))
}

/// Append-only metrics log
#[derive(Debug)]
pub struct MetricsLog {
    inner: CsvLog,
}

impl MetricsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: CsvLog::new(path, METRICS_COLUMNS),
        }
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Open the log eagerly, writing the header if the file is new
    pub fn open(&mut self) -> Result<(), LogError> {
        self.inner.open()
    }

    pub fn append(&mut self, sample: &MetricsSample) -> Result<(), LogError> {
        self.inner.append(sample)
    }
}

/// Read the metrics log back into typed samples. A missing file is empty.
pub fn read_samples(path: &Path) -> Result<Vec<MetricsSample>, LogError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let read_err = |source: csv::Error| LogError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(read_err)?;

    reader
        .deserialize()
        .collect::<Result<Vec<MetricsSample>, _>>()
        .map_err(read_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> MetricsSample {
        MetricsSample {
            timestamp: "2024-03-01 12:00:00".to_string(),
            cpu_usage_pct: 12.346,
            load_avg_1m: 0.5,
            load_avg_5m: 0.25,
            load_avg_15m: 0.126,
            proc_total: 210,
            proc_running: 3,
            proc_sleeping: 200,
            mem_total_mb: 16000.0,
            mem_used_mb: 8000.0,
            mem_avail_mb: 8000.0,
            mem_usage_pct: 50.0,
            disk_total_gb: 100.0,
            disk_used_gb: 25.0,
            disk_free_gb: 75.0,
            disk_usage_pct: 25.0,
            uptime_sec: 3600.5,
            top_cpu_1: "rustc(42):88.0%".to_string(),
            top_cpu_2: "cargo(41):5.5%".to_string(),
            top_cpu_3: String::new(),
            top_mem_1: "rustc(42):12.50%".to_string(),
            top_mem_2: String::new(),
            top_mem_3: String::new(),
        }
    }

    #[test]
    fn test_header_and_two_decimal_formatting() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("system_metrics.csv");

        let mut log = MetricsLog::new(&path);
        log.append(&sample()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], METRICS_COLUMNS.join(","));
        assert_eq!(
            lines[1],
            "2024-03-01 12:00:00,12.35,0.50,0.25,0.13,210,3,200,16000.00,8000.00,8000.00,50.00,\
             100.00,25.00,75.00,25.00,3600.50,rustc(42):88.0%,cargo(41):5.5%,,rustc(42):12.50%,,"
        );
    }

    #[test]
    fn test_column_count() {
        assert_eq!(METRICS_COLUMNS.len(), 23);
    }

    #[test]
    fn test_read_samples_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("system_metrics.csv");

        let mut log = MetricsLog::new(&path);
        log.append(&sample()).unwrap();
        log.append(&MetricsSample::default()).unwrap();

        let samples = read_samples(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].cpu_usage_pct, 12.35);
        assert_eq!(samples[0].proc_total, 210);
        assert_eq!(samples[0].uptime_sec, 3600.5);
        assert_eq!(samples[0].top_cpu_3, "");
        assert_eq!(samples[1], MetricsSample::default());
    }

    #[test]
    fn test_open_writes_header_only() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs/system_metrics.csv");

        MetricsLog::new(&path).open().unwrap();
        MetricsLog::new(&path).open().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(read_samples(&path).unwrap().is_empty());
    }
}
