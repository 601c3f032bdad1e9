//! Filesystem change detection for hostwatch
//!
//! This crate provides:
//! - Per-entry metadata extraction (`lstat` based, symlinks never followed)
//! - Snapshots of a watched directory tree
//! - Snapshot diffing into ordered CREATED / DELETED / MODIFIED events
//! - The `EventSink` seam the polling loop writes events through

pub mod diff;
pub mod error;
pub mod metadata;
pub mod sink;
pub mod snapshot;

// Re-exports
pub use diff::{diff, diff_at, epoch_now, ChangeEvent, ChangeKind, DiffSummary};
pub use error::ScanError;
pub use metadata::{extract, EntryMetadata, EntryType, Extractor, PathKey, Probe};
pub use sink::EventSink;
pub use snapshot::{build, build_with, Snapshot};
