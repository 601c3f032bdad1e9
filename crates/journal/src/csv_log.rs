//! Append-only CSV file with a write-once header
//!
//! The header is written only when the file is created (or found empty).
//! Reopening an existing log checks its header against the expected column
//! list instead of writing another one, so restarts never duplicate it.

use crate::error::LogError;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One CSV row keyed by header name
pub type Row = HashMap<String, String>;

/// Append-only CSV log with a fixed column list
pub struct CsvLog {
    path: PathBuf,
    columns: &'static [&'static str],
    /// Opened lazily on first use
    writer: Option<csv::Writer<File>>,
}

impl CsvLog {
    /// Create a log handle; nothing touches the filesystem until first use
    pub fn new(path: impl Into<PathBuf>, columns: &'static [&'static str]) -> Self {
        Self {
            path: path.into(),
            columns,
            writer: None,
        }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Column list this log enforces
    pub fn columns(&self) -> &'static [&'static str] {
        self.columns
    }

    /// Whether the file has been opened yet
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Open the log now instead of on first append.
    ///
    /// Creates the parent directory and writes the header if needed.
    pub fn open(&mut self) -> Result<(), LogError> {
        self.writer().map(|_| ())
    }

    /// Append one row and flush it to the file
    pub fn append<T: Serialize>(&mut self, row: &T) -> Result<(), LogError> {
        let path = self.path.clone();
        let writer = self.writer()?;

        writer
            .serialize(row)
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|source| LogError::Write { path, source })
    }

    fn writer(&mut self) -> Result<&mut csv::Writer<File>, LogError> {
        match self.writer {
            Some(ref mut writer) => Ok(writer),
            None => Ok(self
                .writer
                .insert(open_for_append(&self.path, self.columns)?)),
        }
    }
}

impl std::fmt::Debug for CsvLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvLog")
            .field("path", &self.path)
            .field("columns", &self.columns.len())
            .field("open", &self.is_open())
            .finish()
    }
}

fn open_for_append(path: &Path, columns: &[&str]) -> Result<csv::Writer<File>, LogError> {
    // 1. Parent directory must exist
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| LogError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // 2. Open for append, creating if absent
    let open_err = |source: io::Error| LogError::Open {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .map_err(open_err)?;
    let len = file.metadata().map_err(open_err)?.len();

    // 3. Existing logs must carry our header; new ones get it now
    let writer = if len > 0 {
        verify_header(path, columns)?;
        if !ends_with_newline(&mut file).map_err(open_err)? {
            warn!("{} ends mid-record, terminating it", path.display());
            file.write_all(b"\n").map_err(open_err)?;
        }
        csv::WriterBuilder::new().has_headers(false).from_writer(file)
    } else {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record(columns)
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|source| LogError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Created {} with {} columns", path.display(), columns.len());
        writer
    };

    Ok(writer)
}

fn verify_header(path: &Path, columns: &[&str]) -> Result<(), LogError> {
    let read_err = |source: csv::Error| LogError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(read_err)?;

    let mut record = csv::StringRecord::new();
    reader.read_record(&mut record).map_err(read_err)?;

    if record.iter().eq(columns.iter().copied()) {
        Ok(())
    } else {
        Err(LogError::SchemaMismatch {
            path: path.to_path_buf(),
            found: record.iter().collect::<Vec<_>>().join(","),
            expected: columns.join(","),
        })
    }
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Read every row of a CSV log as header → value maps.
///
/// A missing file reads as an empty log. Short rows simply lack the trailing
/// keys; this reader is meant for summaries, not validation.
pub fn read_rows(path: &Path) -> Result<Vec<Row>, LogError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let read_err = |source: csv::Error| LogError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(read_err)?;
    let headers = reader.headers().map_err(read_err)?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use tempfile::TempDir;

    const COLUMNS: &[&str] = &["id", "label", "note"];

    #[derive(Serialize)]
    struct TestRow {
        id: u32,
        label: String,
        note: Option<String>,
    }

    fn row(id: u32, label: &str) -> TestRow {
        TestRow {
            id,
            label: label.to_string(),
            note: None,
        }
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_header_written_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.csv");

        let mut log = CsvLog::new(&path, COLUMNS);
        assert!(!path.exists());
        log.append(&row(1, "one")).unwrap();
        log.append(&row(2, "two")).unwrap();

        assert_eq!(lines(&path), vec!["id,label,note", "1,one,", "2,two,"]);
    }

    #[test]
    fn test_reopen_does_not_repeat_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.csv");

        CsvLog::new(&path, COLUMNS).append(&row(1, "one")).unwrap();
        CsvLog::new(&path, COLUMNS).append(&row(2, "two")).unwrap();

        assert_eq!(lines(&path), vec!["id,label,note", "1,one,", "2,two,"]);
    }

    #[test]
    fn test_empty_existing_file_gets_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.csv");
        fs::write(&path, b"").unwrap();

        CsvLog::new(&path, COLUMNS).append(&row(7, "seven")).unwrap();

        assert_eq!(lines(&path), vec!["id,label,note", "7,seven,"]);
    }

    #[test]
    fn test_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("output/logs/deep/log.csv");

        let mut log = CsvLog::new(&path, COLUMNS);
        log.open().unwrap();

        assert!(log.is_open());
        assert_eq!(lines(&path), vec!["id,label,note"]);
    }

    #[test]
    fn test_unusable_parent_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let mut log = CsvLog::new(blocker.join("log.csv"), COLUMNS);
        let err = log.append(&row(1, "one")).unwrap_err();

        assert!(matches!(err, LogError::CreateDir { .. }));
    }

    #[test]
    fn test_foreign_header_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();

        let err = CsvLog::new(&path, COLUMNS).open().unwrap_err();

        match err {
            LogError::SchemaMismatch { found, expected, .. } => {
                assert_eq!(found, "a,b");
                assert_eq!(expected, "id,label,note");
            }
            other => panic!("unexpected error: {other}"),
        }
        // Nothing was appended
        assert_eq!(lines(&path), vec!["a,b", "1,2"]);
    }

    #[test]
    fn test_truncated_record_is_terminated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.csv");
        fs::write(&path, "id,label,note\n1,on").unwrap();

        CsvLog::new(&path, COLUMNS).append(&row(2, "two")).unwrap();

        assert_eq!(lines(&path), vec!["id,label,note", "1,on", "2,two,"]);
    }

    #[test]
    fn test_values_are_quoted_when_needed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.csv");

        CsvLog::new(&path, COLUMNS)
            .append(&row(1, "a,b \"c\""))
            .unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["label"], "a,b \"c\"");
        assert_eq!(rows[0]["note"], "");
    }

    #[test]
    fn test_read_rows_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_rows(&temp_dir.path().join("nope.csv")).unwrap().is_empty());
    }

    #[test]
    fn test_read_rows_tolerates_short_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.csv");
        fs::write(&path, "id,label,note\n1,one\n2,two,x\n").unwrap();

        let rows = read_rows(&path).unwrap();

        assert_eq!(rows.len(), 2);
        assert!(!rows[0].contains_key("note"));
        assert_eq!(rows[1]["note"], "x");
    }
}
