//! Append-only logs and their summaries
//!
//! This crate provides:
//! - A CSV appender that writes its header exactly once per file
//! - The change-event log (schema v1) and its reader
//! - The resource-metrics log, its row type and reader
//! - The plain-text report built from both logs

pub mod csv_log;
pub mod error;
pub mod events;
pub mod metrics;
pub mod report;

// Re-exports
pub use csv_log::{read_rows, CsvLog, Row};
pub use error::LogError;
pub use events::{read_events, EventLog, EventRecord, EVENT_COLUMNS, EVENT_LOG_SCHEMA_VERSION};
pub use metrics::{read_samples, MetricsLog, MetricsSample, METRICS_COLUMNS};
pub use report::{generate_report, DirectorySummary, Report, ReportPaths, SystemSummary};

/// Result type for log operations
pub type Result<T> = std::result::Result<T, LogError>;
