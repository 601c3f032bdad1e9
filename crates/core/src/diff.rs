//! Snapshot diffing
//!
//! Turns two consecutive snapshots into an ordered stream of change events.
//! Emission order is a contract: every CREATED event (sorted by path), then
//! every DELETED event (sorted), then every MODIFIED event (sorted).

use crate::metadata::EntryMetadata;
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Classification of a detected change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Created,
    Deleted,
    Modified,
}

impl ChangeKind {
    /// Name used in the event log
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "CREATED",
            ChangeKind::Deleted => "DELETED",
            ChangeKind::Modified => "MODIFIED",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected difference between two snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Wall-clock epoch seconds at detection (not the entry's mtime)
    pub detected_at: f64,
    /// Current metadata, or last-known metadata for DELETED
    pub entry: EntryMetadata,
    pub old_size: Option<u64>,
    pub new_size: Option<u64>,
    pub old_mtime: Option<f64>,
    pub new_mtime: Option<f64>,
    pub old_perms: Option<String>,
    pub new_perms: Option<String>,
}

impl ChangeEvent {
    /// Entry that appeared since the previous snapshot
    pub fn created(entry: EntryMetadata, detected_at: f64) -> Self {
        Self {
            kind: ChangeKind::Created,
            detected_at,
            old_size: None,
            new_size: Some(entry.size_bytes),
            old_mtime: None,
            new_mtime: Some(entry.modify_time),
            old_perms: None,
            new_perms: Some(entry.permissions.clone()),
            entry,
        }
    }

    /// Entry that disappeared since the previous snapshot
    pub fn deleted(last_known: EntryMetadata, detected_at: f64) -> Self {
        Self {
            kind: ChangeKind::Deleted,
            detected_at,
            old_size: Some(last_known.size_bytes),
            new_size: None,
            old_mtime: Some(last_known.modify_time),
            new_mtime: None,
            old_perms: Some(last_known.permissions.clone()),
            new_perms: None,
            entry: last_known,
        }
    }

    /// Entry whose size, mtime or permissions changed
    pub fn modified(old: &EntryMetadata, new: EntryMetadata, detected_at: f64) -> Self {
        Self {
            kind: ChangeKind::Modified,
            detected_at,
            old_size: Some(old.size_bytes),
            new_size: Some(new.size_bytes),
            old_mtime: Some(old.modify_time),
            new_mtime: Some(new.modify_time),
            old_perms: Some(old.permissions.clone()),
            new_perms: Some(new.permissions.clone()),
            entry: new,
        }
    }

    /// Path key of the affected entry
    pub fn path(&self) -> &str {
        &self.entry.path
    }
}

/// Current wall-clock time as epoch seconds
pub fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Diff two snapshots, stamping events with the current time
pub fn diff(previous: &Snapshot, current: &Snapshot) -> Vec<ChangeEvent> {
    diff_at(previous, current, epoch_now())
}

/// Diff two snapshots, stamping events with `detected_at`.
///
/// Pure function of its inputs. Snapshots iterate in path order, so each
/// group comes out sorted without an explicit sort.
pub fn diff_at(previous: &Snapshot, current: &Snapshot, detected_at: f64) -> Vec<ChangeEvent> {
    let mut events = Vec::new();

    // 1. Created: in current only
    for (path, entry) in current {
        if !previous.contains(path) {
            events.push(ChangeEvent::created(entry.clone(), detected_at));
        }
    }

    // 2. Deleted: in previous only
    for (path, entry) in previous {
        if !current.contains(path) {
            events.push(ChangeEvent::deleted(entry.clone(), detected_at));
        }
    }

    // 3. Modified: in both, with a tracked attribute changed
    for (path, old) in previous {
        if let Some(new) = current.get(path) {
            if old.content_differs(new) {
                events.push(ChangeEvent::modified(old, new.clone(), detected_at));
            }
        }
    }

    events
}

/// Per-kind counts of a diff result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub created: usize,
    pub deleted: usize,
    pub modified: usize,
}

impl DiffSummary {
    /// Count events by kind
    pub fn of(events: &[ChangeEvent]) -> Self {
        let mut summary = Self::default();
        for event in events {
            match event.kind {
                ChangeKind::Created => summary.created += 1,
                ChangeKind::Deleted => summary.deleted += 1,
                ChangeKind::Modified => summary.modified += 1,
            }
        }
        summary
    }

    /// Total number of events
    pub fn total(&self) -> usize {
        self.created + self.deleted + self.modified
    }

    /// Whether nothing changed
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} deleted, {} modified",
            self.created, self.deleted, self.modified
        )
    }
}
