//! Host resource sampling for hostwatch
//!
//! This crate provides:
//! - One-shot collection of CPU, load, process, memory, disk and uptime figures
//! - Top-3 processes by CPU and by memory
//! - A periodic task appending each sample to the metrics log

pub mod collect;
pub mod error;
pub mod runner;

// Re-exports
pub use collect::{top_by_cpu, top_by_memory, Collector, DiskFigures, ProcessCounts, ProcessLoad, TIMESTAMP_FORMAT};
pub use error::SampleError;
pub use runner::Sampler;
