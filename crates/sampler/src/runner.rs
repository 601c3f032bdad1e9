//! Periodic sampling task

use crate::collect::Collector;
use crate::error::SampleError;
use hostwatch_journal::{MetricsLog, MetricsSample};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Samples host resources on a fixed interval
#[derive(Debug, Clone)]
pub struct Sampler {
    /// Shared with the blocking pool while a sample is being taken
    collector: Arc<Mutex<Collector>>,

    /// Idle time after each sample
    interval: Duration,
}

impl Sampler {
    /// A zero `interval` samples back-to-back, each sample still spanning
    /// the CPU measurement window.
    pub fn new(disk_mount: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            collector: Arc::new(Mutex::new(Collector::new(disk_mount))),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Take one sample on the blocking pool
    pub async fn sample_once(&self) -> Result<MetricsSample, SampleError> {
        let collector = Arc::clone(&self.collector);
        let sample = tokio::task::spawn_blocking(move || collector.lock().sample()).await?;
        Ok(sample)
    }

    /// Sample immediately, then again after every interval, until the task
    /// is cancelled.
    ///
    /// Only returns when the log rejects a sample.
    pub async fn run(self, mut log: MetricsLog) -> Result<(), SampleError> {
        info!(
            "Sampling resources to {} (interval: {:?})",
            log.path().display(),
            self.interval
        );

        loop {
            let sample = self.sample_once().await?;
            log.append(&sample)?;
            debug!(
                "Sample at {}: cpu {:.2}%, mem {:.2}%, disk {:.2}%",
                sample.timestamp,
                sample.cpu_usage_pct,
                sample.mem_usage_pct,
                sample.disk_usage_pct
            );

            tokio::time::sleep(self.interval).await;
        }
    }
}
