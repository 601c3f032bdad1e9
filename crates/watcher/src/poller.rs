//! Polling driver: sleep, snapshot, diff, append
//!
//! The previous snapshot is owned by the caller of `cycle` and threaded
//! through it by value; `run` owns it for the lifetime of the loop. Nothing
//! survives a restart: every run starts from a fresh baseline.

use crate::error::PollError;
use hostwatch_core::{build, diff, DiffSummary, EventSink, ScanError, Snapshot};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What one poll cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new snapshot was taken and every event was appended
    Applied { summary: DiffSummary },
    /// The root could not be enumerated; the previous snapshot was kept
    Skipped,
}

/// Polling driver for one watched root
#[derive(Debug, Clone)]
pub struct Poller {
    /// Directory being watched
    root: PathBuf,

    /// Idle time after each cycle before the next one starts
    interval: Duration,
}

impl Poller {
    /// A zero `interval` polls back-to-back.
    pub fn new(root: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            root: root.into(),
            interval,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Take the startup snapshot. Failure here is fatal.
    pub async fn baseline(&self) -> Result<Snapshot, PollError> {
        let snapshot = self.snapshot().await?.map_err(|source| PollError::Baseline {
            root: self.root.clone(),
            source,
        })?;

        info!(
            "Baseline of {}: {} entries",
            self.root.display(),
            snapshot.len()
        );
        Ok(snapshot)
    }

    /// Run one cycle against `previous`.
    ///
    /// Returns the snapshot the next cycle should diff against: the new one
    /// when the cycle applied, `previous` unchanged when it was skipped.
    pub async fn cycle<S>(
        &self,
        previous: Snapshot,
        sink: &mut S,
    ) -> Result<(Snapshot, CycleOutcome), PollError>
    where
        S: EventSink,
    {
        // 1. Enumerate; a failed walk keeps the old state
        let current = match self.snapshot().await? {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Skipping poll cycle: {}", e);
                return Ok((previous, CycleOutcome::Skipped));
            }
        };

        // 2. Diff and append in emission order
        let events = diff(&previous, &current);
        for event in &events {
            debug!("{} {}", event.kind, event.path());
            sink.append(event)
                .map_err(|e| PollError::Sink(Box::new(e)))?;
        }

        let summary = DiffSummary::of(&events);
        if summary.is_empty() {
            debug!("No changes under {}", self.root.display());
        } else {
            info!("Detected {}", summary);
        }

        // 3. Current becomes previous
        Ok((current, CycleOutcome::Applied { summary }))
    }

    /// Take the baseline and poll until the task is cancelled.
    ///
    /// Only returns on a fatal error.
    pub async fn run<S>(self, sink: S) -> Result<(), PollError>
    where
        S: EventSink,
    {
        let baseline = self.baseline().await?;
        self.run_from(baseline, sink).await
    }

    /// Poll starting from an already-taken baseline.
    ///
    /// The full interval elapses after every cycle, however long the cycle
    /// took.
    pub async fn run_from<S>(self, baseline: Snapshot, mut sink: S) -> Result<(), PollError>
    where
        S: EventSink,
    {
        info!(
            "Polling {} (interval: {:?})",
            self.root.display(),
            self.interval
        );

        let mut previous = baseline;
        loop {
            tokio::time::sleep(self.interval).await;
            let (next, _) = self.cycle(previous, &mut sink).await?;
            previous = next;
        }
    }

    /// Build a snapshot on the blocking pool
    async fn snapshot(&self) -> Result<Result<Snapshot, ScanError>, PollError> {
        let root = self.root.clone();
        Ok(tokio::task::spawn_blocking(move || build(&root)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use hostwatch_core::{ChangeEvent, ChangeKind};
    use std::fs;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;
    use tempfile::TempDir;

    /// Sink that can be inspected while `run` owns it
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<ChangeEvent>>>);

    impl EventSink for SharedSink {
        type Error = io::Error;

        fn append(&mut self, event: &ChangeEvent) -> Result<(), Self::Error> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    /// Sink that takes `delay` per event and records when each append ran
    struct SlowSink {
        delay: Duration,
        spans: Arc<Mutex<Vec<(Instant, Instant)>>>,
    }

    impl EventSink for SlowSink {
        type Error = io::Error;

        fn append(&mut self, _event: &ChangeEvent) -> Result<(), Self::Error> {
            let start = Instant::now();
            std::thread::sleep(self.delay);
            self.spans.lock().unwrap().push((start, Instant::now()));
            Ok(())
        }
    }

    struct FailingSink;

    impl EventSink for FailingSink {
        type Error = io::Error;

        fn append(&mut self, _event: &ChangeEvent) -> Result<(), Self::Error> {
            Err(io::Error::other("disk full"))
        }
    }

    fn poller(root: &Path) -> Poller {
        Poller::new(root, Duration::from_millis(50))
    }

    fn kinds(events: &[ChangeEvent]) -> Vec<(ChangeKind, String)> {
        events
            .iter()
            .map(|e| (e.kind, e.entry.name.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_baseline_then_idle_cycle_reports_nothing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("existing.txt"), b"hello").unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();

        let poller = poller(temp_dir.path());
        let baseline = poller.baseline().await.unwrap();
        assert_eq!(baseline.len(), 2);

        let mut sink = Vec::new();
        let (next, outcome) = poller.cycle(baseline, &mut sink).await.unwrap();

        assert!(sink.is_empty());
        assert_eq!(next.len(), 2);
        assert_eq!(
            outcome,
            CycleOutcome::Applied {
                summary: DiffSummary::default()
            }
        );
    }

    #[tokio::test]
    async fn test_baseline_of_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let poller = poller(&temp_dir.path().join("missing"));

        let err = poller.baseline().await.unwrap_err();
        assert!(matches!(err, PollError::Baseline { .. }));
    }

    #[tokio::test]
    async fn test_cycle_detects_create_modify_delete() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let edited = root.join("edited.txt");
        let doomed = root.join("doomed.txt");
        fs::write(&edited, b"v1").unwrap();
        fs::write(&doomed, b"bye").unwrap();
        set_file_mtime(&edited, FileTime::from_unix_time(1_000_000, 0)).unwrap();

        let poller = poller(root);
        let baseline = poller.baseline().await.unwrap();

        fs::write(root.join("fresh.txt"), b"new").unwrap();
        fs::write(&edited, b"version two").unwrap();
        set_file_mtime(&edited, FileTime::from_unix_time(2_000_000, 0)).unwrap();
        fs::remove_file(&doomed).unwrap();

        let mut sink = Vec::new();
        let (next, outcome) = poller.cycle(baseline, &mut sink).await.unwrap();

        assert_eq!(
            kinds(&sink),
            vec![
                (ChangeKind::Created, "fresh.txt".to_string()),
                (ChangeKind::Deleted, "doomed.txt".to_string()),
                (ChangeKind::Modified, "edited.txt".to_string()),
            ]
        );
        assert_eq!(sink[2].old_size, Some(2));
        assert_eq!(sink[2].new_size, Some(11));
        assert_eq!(
            outcome,
            CycleOutcome::Applied {
                summary: DiffSummary {
                    created: 1,
                    deleted: 1,
                    modified: 1
                }
            }
        );

        // The next cycle diffs against the new state
        let mut sink = Vec::new();
        poller.cycle(next, &mut sink).await.unwrap();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_cycle_skipped_when_root_disappears() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("watched");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a.txt"), b"a").unwrap();

        let poller = poller(&root);
        let baseline = poller.baseline().await.unwrap();

        fs::remove_dir_all(&root).unwrap();

        let mut sink = Vec::new();
        let (kept, outcome) = poller.cycle(baseline.clone(), &mut sink).await.unwrap();

        assert_eq!(outcome, CycleOutcome::Skipped);
        assert!(sink.is_empty());
        assert_eq!(kept, baseline);

        // Root comes back empty: the kept state turns into a DELETED event
        fs::create_dir(&root).unwrap();
        let (_, outcome) = poller.cycle(kept, &mut sink).await.unwrap();
        assert_eq!(kinds(&sink), vec![(ChangeKind::Deleted, "a.txt".to_string())]);
        assert!(matches!(outcome, CycleOutcome::Applied { .. }));
    }

    #[tokio::test]
    async fn test_sink_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let poller = poller(temp_dir.path());
        let baseline = poller.baseline().await.unwrap();

        fs::write(temp_dir.path().join("new.txt"), b"x").unwrap();

        let err = poller.cycle(baseline, &mut FailingSink).await.unwrap_err();
        assert!(matches!(err, PollError::Sink(_)));
        assert!(err.to_string().contains("sink"));
    }

    #[tokio::test]
    async fn test_run_reports_changes_after_start() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("before.txt"), b"old").unwrap();

        let sink = SharedSink::default();
        let events = sink.0.clone();
        let handle = tokio::spawn(poller(temp_dir.path()).run(sink));

        // Let the baseline land before changing anything
        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(temp_dir.path().join("after.txt"), b"new").unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while events.lock().unwrap().is_empty() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        handle.abort();

        let seen = events.lock().unwrap().clone();
        assert_eq!(kinds(&seen), vec![(ChangeKind::Created, "after.txt".to_string())]);
    }

    #[tokio::test]
    async fn test_run_stops_on_sink_failure() {
        let temp_dir = TempDir::new().unwrap();
        let handle = tokio::spawn(poller(temp_dir.path()).run(FailingSink));

        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(temp_dir.path().join("trigger.txt"), b"x").unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(PollError::Sink(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_interval_idles_after_slow_cycles() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        let interval = Duration::from_millis(300);

        // Appends are slower than the interval, so every cycle overruns it
        let spans = Arc::new(Mutex::new(Vec::new()));
        let sink = SlowSink {
            delay: Duration::from_millis(150),
            spans: spans.clone(),
        };
        let handle = tokio::spawn(Poller::new(&root, interval).run(sink));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let stop = Arc::new(AtomicBool::new(false));
        let writer = {
            let stop = stop.clone();
            std::thread::spawn(move || {
                let mut n = 0;
                while !stop.load(Ordering::Relaxed) {
                    fs::write(root.join(format!("f{n}.txt")), b"x").unwrap();
                    n += 1;
                    std::thread::sleep(Duration::from_millis(100));
                }
            })
        };

        tokio::time::sleep(Duration::from_secs(3)).await;
        stop.store(true, Ordering::Relaxed);
        writer.join().unwrap();
        handle.abort();

        // Appends within a cycle run back-to-back; between cycles the
        // poller must have been idle for the whole interval
        let spans = spans.lock().unwrap().clone();
        let gaps: Vec<Duration> = spans
            .windows(2)
            .map(|pair| pair[1].0.duration_since(pair[0].1))
            .collect();
        assert!(spans.len() >= 4, "only {} events logged", spans.len());
        assert!(
            gaps.iter().any(|gap| *gap >= interval),
            "no idle interval between cycles: {:?}",
            gaps
        );
    }

    #[tokio::test]
    async fn test_zero_interval_polls_back_to_back() {
        let temp_dir = TempDir::new().unwrap();
        let sink = SharedSink::default();
        let events = sink.0.clone();
        let handle = tokio::spawn(Poller::new(temp_dir.path(), Duration::ZERO).run(sink));

        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(temp_dir.path().join("soon.txt"), b"x").unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while events.lock().unwrap().is_empty() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        assert!(!handle.is_finished());
        handle.abort();

        let seen = events.lock().unwrap().clone();
        assert_eq!(kinds(&seen), vec![(ChangeKind::Created, "soon.txt".to_string())]);
    }
}
