//! Change-event log
//!
//! The column list below is the schema. Downstream readers (the report
//! generator included) rely on it staying put, so any change to it must bump
//! `EVENT_LOG_SCHEMA_VERSION` and start a new file.

use crate::csv_log::CsvLog;
use crate::error::LogError;
use hostwatch_core::{ChangeEvent, ChangeKind, EntryType, EventSink};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Version of the column layout in `EVENT_COLUMNS`
pub const EVENT_LOG_SCHEMA_VERSION: u32 = 1;

/// Columns of the change-event log, in file order
pub const EVENT_COLUMNS: &[&str] = &[
    "event",
    "detected_ts",
    "path",
    "name",
    "ftype",
    "size",
    "perms",
    "owner",
    "group",
    "atime",
    "mtime",
    "ctime",
    "old_size",
    "new_size",
    "old_mtime",
    "new_mtime",
    "old_perms",
    "new_perms",
];

/// One row of the change-event log.
///
/// Field order must match `EVENT_COLUMNS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event: ChangeKind,
    pub detected_ts: f64,
    pub path: String,
    pub name: String,
    pub ftype: EntryType,
    pub size: u64,
    pub perms: String,
    pub owner: String,
    pub group: String,
    pub atime: f64,
    pub mtime: f64,
    pub ctime: f64,
    pub old_size: Option<u64>,
    pub new_size: Option<u64>,
    pub old_mtime: Option<f64>,
    pub new_mtime: Option<f64>,
    pub old_perms: Option<String>,
    pub new_perms: Option<String>,
}

impl From<&ChangeEvent> for EventRecord {
    fn from(event: &ChangeEvent) -> Self {
        let entry = &event.entry;
        Self {
            event: event.kind,
            detected_ts: event.detected_at,
            path: entry.path.clone(),
            name: entry.name.clone(),
            ftype: entry.entry_type,
            size: entry.size_bytes,
            perms: entry.permissions.clone(),
            owner: entry.owner.clone(),
            group: entry.group.clone(),
            atime: entry.access_time,
            mtime: entry.modify_time,
            ctime: entry.change_time,
            old_size: event.old_size,
            new_size: event.new_size,
            old_mtime: event.old_mtime,
            new_mtime: event.new_mtime,
            old_perms: event.old_perms.clone(),
            new_perms: event.new_perms.clone(),
        }
    }
}

/// Append-only change-event log
#[derive(Debug)]
pub struct EventLog {
    inner: CsvLog,
}

impl EventLog {
    /// Create a handle for the log at `path` (opened on first append)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: CsvLog::new(path, EVENT_COLUMNS),
        }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Open the log eagerly so configuration problems surface at startup
    pub fn open(&mut self) -> Result<(), LogError> {
        self.inner.open()
    }

    /// Append one event as exactly one record
    pub fn append(&mut self, event: &ChangeEvent) -> Result<(), LogError> {
        self.inner.append(&EventRecord::from(event))
    }
}

impl EventSink for EventLog {
    type Error = LogError;

    fn append(&mut self, event: &ChangeEvent) -> Result<(), Self::Error> {
        EventLog::append(self, event)
    }
}

/// Read the change-event log back into typed records.
///
/// A missing file reads as an empty log.
pub fn read_events(path: &Path) -> Result<Vec<EventRecord>, LogError> {
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
        .collect::<Result<Vec<EventRecord>, _>>()
        .map_err(read_err)
}
