//! Metadata extraction for a single filesystem entry
//!
//! Every attribute comes from `lstat`: a symlink is described as a link and
//! its target is never consulted. Owner and group names are resolved through
//! the system user database and fall back to the numeric id when the lookup
//! fails, so extraction itself never errors.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Canonical string identity of an entry (root joined with its relative path)
pub type PathKey = String;

/// Type of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Regular file (also covers fifos, sockets and device nodes)
    Regular,
    /// Directory
    Directory,
    /// Symbolic link (never followed)
    Symlink,
}

impl EntryType {
    /// Name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Regular => "regular",
            EntryType::Directory => "directory",
            EntryType::Symlink => "symlink",
        }
    }

    fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            EntryType::Symlink
        } else if file_type.is_dir() {
            EntryType::Directory
        } else {
            EntryType::Regular
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes of one filesystem entry at observation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Join key between snapshots
    pub path: PathKey,
    /// Final path component
    pub name: String,
    pub entry_type: EntryType,
    /// Byte length for regular files, 0 for directories and symlinks
    pub size_bytes: u64,
    /// Lowest nine mode bits in octal, e.g. `0o644`
    pub permissions: String,
    pub owner: String,
    pub group: String,
    /// Epoch seconds
    pub access_time: f64,
    /// Epoch seconds
    pub modify_time: f64,
    /// Epoch seconds (inode change time on unix)
    pub change_time: f64,
}

impl EntryMetadata {
    /// Whether `other` differs in any attribute that counts as a modification.
    ///
    /// Only size, modify time and permissions are compared. Owner, group,
    /// type, access time and change time are deliberately ignored.
    pub fn content_differs(&self, other: &EntryMetadata) -> bool {
        self.size_bytes != other.size_bytes
            || self.modify_time != other.modify_time
            || self.permissions != other.permissions
    }
}

/// Result of inspecting one path
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    /// The entry was inspected successfully
    Found(EntryMetadata),
    /// The entry disappeared between enumeration and stat
    Vanished,
    /// The entry exists but could not be inspected
    Unreadable(io::ErrorKind),
}

impl Probe {
    /// Metadata if the probe succeeded
    pub fn found(self) -> Option<EntryMetadata> {
        match self {
            Probe::Found(meta) => Some(meta),
            Probe::Vanished | Probe::Unreadable(_) => None,
        }
    }
}

/// Extractor with owner/group name caches.
///
/// One extractor is meant to live for a single scan so that renamed accounts
/// are picked up on the next cycle.
#[derive(Debug, Default)]
pub struct Extractor {
    owners: AHashMap<u32, String>,
    groups: AHashMap<u32, String>,
}

impl Extractor {
    /// Create an extractor with empty caches
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect `path` without following symlinks
    pub fn probe(&mut self, path: &Path) -> Probe {
        match fs::symlink_metadata(path) {
            Ok(meta) => Probe::Found(self.describe(path, &meta)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Probe::Vanished,
            Err(e) => Probe::Unreadable(e.kind()),
        }
    }

    /// Build an `EntryMetadata` from already-fetched `lstat` output
    pub fn describe(&mut self, path: &Path, meta: &fs::Metadata) -> EntryMetadata {
        let entry_type = EntryType::from_file_type(meta.file_type());
        let size_bytes = match entry_type {
            EntryType::Regular => meta.len(),
            EntryType::Directory | EntryType::Symlink => 0,
        };
        let stat = platform::stat_fields(meta);

        let owner = self
            .owners
            .entry(stat.uid)
            .or_insert_with(|| platform::owner_name(stat.uid))
            .clone();
        let group = self
            .groups
            .entry(stat.gid)
            .or_insert_with(|| platform::group_name(stat.gid))
            .clone();

        EntryMetadata {
            path: path.to_string_lossy().into_owned(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            entry_type,
            size_bytes,
            permissions: format_permissions(stat.mode),
            owner,
            group,
            access_time: stat.atime,
            modify_time: stat.mtime,
            change_time: stat.ctime,
        }
    }
}

/// Inspect a single path with a throwaway extractor
pub fn extract(path: &Path) -> Probe {
    Extractor::new().probe(path)
}

/// Render the lowest nine mode bits as `0o...`
pub fn format_permissions(mode: u32) -> String {
    format!("{:#o}", mode & 0o777)
}

/// Raw stat fields in a platform-neutral shape
struct StatFields {
    mode: u32,
    uid: u32,
    gid: u32,
    atime: f64,
    mtime: f64,
    ctime: f64,
}

#[cfg(unix)]
mod platform {
    use super::StatFields;
    use nix::unistd::{Gid, Group, Uid, User};
    use std::fs::Metadata;
    use std::os::unix::fs::MetadataExt;

    pub(super) fn stat_fields(meta: &Metadata) -> StatFields {
        StatFields {
            mode: meta.mode(),
            uid: meta.uid(),
            gid: meta.gid(),
            atime: epoch_secs(meta.atime(), meta.atime_nsec()),
            mtime: epoch_secs(meta.mtime(), meta.mtime_nsec()),
            ctime: epoch_secs(meta.ctime(), meta.ctime_nsec()),
        }
    }

    fn epoch_secs(secs: i64, nsecs: i64) -> f64 {
        secs as f64 + nsecs as f64 / 1_000_000_000.0
    }

    pub(super) fn owner_name(uid: u32) -> String {
        match User::from_uid(Uid::from_raw(uid)) {
            Ok(Some(user)) => user.name,
            _ => uid.to_string(),
        }
    }

    pub(super) fn group_name(gid: u32) -> String {
        match Group::from_gid(Gid::from_raw(gid)) {
            Ok(Some(group)) => group.name,
            _ => gid.to_string(),
        }
    }
}

#[cfg(not(unix))]
mod platform {
    use super::StatFields;
    use std::fs::Metadata;
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(super) fn stat_fields(meta: &Metadata) -> StatFields {
        // Synthesize a mode for platforms without unix permissions
        let mode = if meta.is_dir() {
            0o755
        } else if meta.permissions().readonly() {
            0o444
        } else {
            0o644
        };
        let mtime = epoch_secs(meta.modified().ok());

        StatFields {
            mode,
            uid: 0,
            gid: 0,
            atime: epoch_secs(meta.accessed().ok()),
            mtime,
            ctime: meta.created().ok().map_or(mtime, |t| epoch_secs(Some(t))),
        }
    }

    fn epoch_secs(time: Option<SystemTime>) -> f64 {
        time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    pub(super) fn owner_name(uid: u32) -> String {
        uid.to_string()
    }

    pub(super) fn group_name(gid: u32) -> String {
        gid.to_string()
    }
}
