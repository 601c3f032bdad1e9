//! Snapshots of a watched directory tree

use crate::error::ScanError;
use crate::metadata::{EntryMetadata, Extractor, PathKey, Probe};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Complete point-in-time view of a directory subtree.
///
/// Entries are keyed by `PathKey` and iterate in key order, which is what
/// gives the differ its deterministic output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: BTreeMap<PathKey, EntryMetadata>,
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any previous record for the same path
    pub fn insert(&mut self, entry: EntryMetadata) -> Option<EntryMetadata> {
        self.entries.insert(entry.path.clone(), entry)
    }

    /// Get an entry by path key
    pub fn get(&self, path: &str) -> Option<&EntryMetadata> {
        self.entries.get(path)
    }

    /// Whether the snapshot holds a record for `path`
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &PathKey> {
        self.entries.keys()
    }

    /// Entries in path order
    pub fn iter(&self) -> btree_map::Iter<'_, PathKey, EntryMetadata> {
        self.entries.iter()
    }
}

impl FromIterator<EntryMetadata> for Snapshot {
    fn from_iter<I: IntoIterator<Item = EntryMetadata>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for entry in iter {
            snapshot.insert(entry);
        }
        snapshot
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a PathKey, &'a EntryMetadata);
    type IntoIter = btree_map::Iter<'a, PathKey, EntryMetadata>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Snapshot every descendant of `root`.
///
/// The root itself is not recorded. Symlinks are recorded but never
/// descended into.
pub fn build(root: &Path) -> Result<Snapshot, ScanError> {
    let mut extractor = Extractor::new();
    build_with(root, |path| extractor.probe(path))
}

/// Snapshot every descendant of `root`, inspecting entries with `probe`.
///
/// Entries whose probe is not `Found` are left out of this snapshot; they
/// either reappear next cycle or surface as DELETED once they are gone for
/// good. Only a failure on the root itself aborts the scan.
pub fn build_with<F>(root: &Path, mut probe: F) -> Result<Snapshot, ScanError>
where
    F: FnMut(&Path) -> Probe,
{
    // 1. Root must be a readable directory
    let root_meta =
        fs::metadata(root).map_err(|e| ScanError::from_root_io(root.to_path_buf(), e))?;
    if !root_meta.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut snapshot = Snapshot::new();
    let mut skipped = 0usize;

    // 2. Walk descendants (walkdir keeps its own stack of open directories)
    for entry in WalkDir::new(root).follow_links(false).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 || err.path() == Some(root) => {
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("filesystem loop at watched root"));
                return Err(ScanError::from_root_io(root.to_path_buf(), source));
            }
            Err(err) => {
                debug!("Skipping unreadable entry during scan: {}", err);
                skipped += 1;
                continue;
            }
        };

        // 3. Inspect each entry on its own
        match probe(entry.path()) {
            Probe::Found(meta) => {
                snapshot.insert(meta);
            }
            Probe::Vanished => {
                trace!("Entry vanished before stat: {}", entry.path().display());
                skipped += 1;
            }
            Probe::Unreadable(kind) => {
                debug!("Cannot stat {}: {:?}", entry.path().display(), kind);
                skipped += 1;
            }
        }
    }

    debug!(
        "Snapshot of {}: {} entries, {} skipped",
        root.display(),
        snapshot.len(),
        skipped
    );

    Ok(snapshot)
}
