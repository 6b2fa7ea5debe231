//! The monitor: a state machine driving locator, header mapping and tailer.
//!
//! ```text
//!   AwaitFile ──found──> HeadersRead ──opened──> Tailing ──I/O error──> Recovering
//!     ^   ^                                         │                        │
//!     │   └─────────────── rotation ────────────────┘                        │
//!     └──────────────────────────── backoff elapsed ─────────────────────────┘
//! ```
//!
//! An unreadable header line stops the monitor for good (`Stopped`); every
//! other failure moves it back to an earlier state. [`Monitor::step`] performs
//! one transition and returns how long to wait before the next one, so tests
//! can drive the machine without sleeping.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::collector::header::LogLayout;
use crate::collector::locator::LogLocator;
use crate::collector::record::Reading;
use crate::collector::tailer::FileTailer;
use crate::collector::traits::FileSystem;
use crate::config::MonitorConfig;
use crate::error::TailError;
use crate::model::Status;
use crate::store::SnapshotStore;

/// Granularity of interruptible sleeps.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Externally visible state of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitFile,
    HeadersRead,
    Tailing,
    Recovering,
    Stopped,
}

enum State {
    AwaitFile,
    HeadersRead { path: PathBuf, layout: LogLayout },
    Tailing { tailer: FileTailer, layout: LogLayout },
    Recovering,
    Stopped,
}

/// Sole writer of the [`SnapshotStore`].
pub struct Monitor<F: FileSystem> {
    locator: LogLocator<F>,
    config: MonitorConfig,
    store: SnapshotStore,
    state: State,
    /// Set after the first locate miss so that waiting is logged once.
    waiting: bool,
    records: u64,
}

impl<F: FileSystem> Monitor<F> {
    pub fn new(fs: F, config: MonitorConfig, store: SnapshotStore) -> Self {
        Self {
            locator: LogLocator::new(fs, config.source.clone()),
            config,
            store,
            state: State::AwaitFile,
            waiting: false,
            records: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::AwaitFile => Phase::AwaitFile,
            State::HeadersRead { .. } => Phase::HeadersRead,
            State::Tailing { .. } => Phase::Tailing,
            State::Recovering => Phase::Recovering,
            State::Stopped => Phase::Stopped,
        }
    }

    /// Records published so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Performs one transition.
    ///
    /// Returns the delay before the next step, or `None` once stopped.
    pub fn step(&mut self) -> Option<Duration> {
        let state = std::mem::replace(&mut self.state, State::Stopped);
        let (next, delay) = match state {
            State::AwaitFile => self.await_file(),
            State::HeadersRead { path, layout } => self.open(path, layout),
            State::Tailing { tailer, layout } => self.tick(tailer, layout),
            State::Recovering => {
                debug!("recovery backoff elapsed");
                (State::AwaitFile, Duration::ZERO)
            }
            State::Stopped => return None,
        };
        self.state = next;
        if matches!(self.state, State::Stopped) {
            None
        } else {
            Some(delay)
        }
    }

    fn await_file(&mut self) -> (State, Duration) {
        let path = match self.locator.locate() {
            Ok(path) => path,
            Err(e) => {
                if !self.waiting {
                    info!(error = %e, "waiting for log file");
                    self.waiting = true;
                } else {
                    trace!(error = %e, "log file still missing");
                }
                return (State::AwaitFile, self.config.locate_interval);
            }
        };
        self.waiting = false;

        match LogLayout::read(&path) {
            Ok(layout) => {
                info!(
                    path = %path.display(),
                    delimiter = %layout.delimiter,
                    columns = layout.column_count,
                    mapped = layout.columns.resolved(),
                    "log file found, headers mapped"
                );
                for (field, column) in layout.columns.iter() {
                    debug!(%field, ?column, "column mapping");
                }
                self.store.set_source(&path);
                (State::HeadersRead { path, layout }, Duration::ZERO)
            }
            Err(e) if e.is_recoverable() => {
                debug!(error = %e, "header not available yet");
                (State::AwaitFile, self.config.locate_interval)
            }
            Err(e) => {
                error!(error = %e, "cannot read log header, monitor stopped");
                self.store.set_status(Status::Error, Some(e.to_string()));
                (State::Stopped, Duration::ZERO)
            }
        }
    }

    fn open(&mut self, path: PathBuf, layout: LogLayout) -> (State, Duration) {
        match FileTailer::open_at_end(path, self.config.tail_window) {
            Ok(tailer) => {
                debug!(path = %tailer.path().display(), offset = tailer.offset(), "tailing");
                (State::Tailing { tailer, layout }, self.config.interval)
            }
            Err(e) => self.recover(e),
        }
    }

    fn tick(&mut self, mut tailer: FileTailer, layout: LogLayout) -> (State, Duration) {
        match tailer.poll() {
            Ok(Some(line)) => match Reading::parse(&line, &layout) {
                Some(reading) => {
                    self.store.write(&reading);
                    self.records += 1;
                    debug!(offset = tailer.offset(), records = self.records, "record published");
                }
                None => trace!(line = %line, "row skipped"),
            },
            Ok(None) => trace!("no complete row in window"),
            Err(e @ TailError::Rotated { .. }) => {
                info!(error = %e, "log rotated, locating again");
                return (State::AwaitFile, Duration::ZERO);
            }
            Err(e) => return self.recover(e),
        }
        (State::Tailing { tailer, layout }, self.config.interval)
    }

    /// Drops the handle and schedules a retry after the backoff.
    fn recover(&mut self, e: TailError) -> (State, Duration) {
        warn!(error = %e, backoff = ?self.config.recovery_backoff, "tailing interrupted");
        self.store.set_status(Status::Error, Some(e.to_string()));
        (State::Recovering, self.config.recovery_backoff)
    }

    /// Steps until stopped or `running` is cleared.
    pub fn run(mut self, running: &AtomicBool) {
        info!(source = %self.locator.source().location().display(), "monitor started");
        while running.load(Ordering::SeqCst) {
            let Some(delay) = self.step() else {
                break;
            };
            sleep_while(delay, running);
        }
        info!(records = self.records, "monitor exited");
    }
}

impl<F: FileSystem + 'static> Monitor<F> {
    /// Runs the monitor on a dedicated thread.
    pub fn spawn(self) -> io::Result<MonitorHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();
        let thread = thread::Builder::new()
            .name("hwtail-monitor".into())
            .spawn(move || self.run(&r))?;
        Ok(MonitorHandle {
            running,
            thread: Some(thread),
        })
    }
}

/// Sleeps in short slices, returning early when `running` is cleared.
fn sleep_while(duration: Duration, running: &AtomicBool) {
    let mut remaining = duration;
    while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
        let sleep_time = remaining.min(SLEEP_SLICE);
        thread::sleep(sleep_time);
        remaining = remaining.saturating_sub(sleep_time);
    }
}

/// Owner of a running monitor thread.
#[derive(Debug)]
pub struct MonitorHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Whether the monitor thread has exited (stopped or shut down).
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Requests a stop and waits for the thread.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            error!("monitor thread panicked");
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::collector::traits::RealFs;
    use crate::config::LogSource;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use std::time::Instant;

    const HEADER: &str =
        "Total CPU Usage,CPU Package Power,GPU Core Load,Physical Memory Used,Physical Memory Load";

    fn monitor_for(dir: &Path) -> (Monitor<RealFs>, SnapshotStore) {
        let store = SnapshotStore::new();
        let config = MonitorConfig::new(LogSource::directory(dir));
        (Monitor::new(RealFs::new(), config, store.clone()), store)
    }

    /// Steps until the monitor reaches `phase`, at most `limit` times.
    fn step_until(monitor: &mut Monitor<RealFs>, phase: Phase, limit: usize) {
        for _ in 0..limit {
            if monitor.phase() == phase {
                return;
            }
            monitor.step();
        }
        assert_eq!(monitor.phase(), phase);
    }

    #[test]
    fn end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.csv");
        fs::write(&path, format!("{HEADER}\n55.2,45.1,30.0,8192,50.0\n")).unwrap();
        let (mut monitor, store) = monitor_for(dir.path());

        assert_eq!(monitor.step(), Some(Duration::ZERO));
        assert_eq!(monitor.phase(), Phase::HeadersRead);
        assert_eq!(monitor.step(), Some(Duration::from_millis(1500)));
        assert_eq!(monitor.phase(), Phase::Tailing);
        assert_eq!(store.read().raw.status, Status::Starting);

        monitor.step();
        let snap = store.read();
        assert_eq!(snap.raw.status, Status::Live);
        assert_eq!(snap.cpu.usage, Some(55.2));
        assert_eq!(snap.cpu.power, Some(45.1));
        assert_eq!(snap.cpu.temp, Some(45.1));
        assert_eq!(snap.gpu.usage, Some(30.0));
        assert_eq!(snap.ram.used_gb, Some(8.0));
        assert_eq!(snap.ram.usage_percent, Some(50.0));
        assert_eq!(snap.ram.total_gb, Some(16.0));
        assert_eq!(snap.raw.source, Some(path.display().to_string()));
        assert_eq!(monitor.records(), 1);
    }

    #[test]
    fn appended_rows_are_followed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.csv");
        fs::write(&path, format!("{HEADER}\n1,1,1,1,1\n")).unwrap();
        let (mut monitor, store) = monitor_for(dir.path());
        step_until(&mut monitor, Phase::Tailing, 3);

        let mut f = fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(f, "70,80,90,16384,25").unwrap();
        monitor.step();

        let snap = store.read();
        assert_eq!(snap.cpu.usage, Some(70.0));
        assert_eq!(snap.ram.total_gb, Some(64.0));
    }

    #[test]
    fn waits_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut monitor, store) = monitor_for(&dir.path().join("not-yet"));

        assert_eq!(monitor.step(), Some(Duration::from_secs(2)));
        assert_eq!(monitor.phase(), Phase::AwaitFile);
        assert_eq!(store.read().raw.status, Status::Starting);
    }

    #[test]
    fn empty_file_keeps_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.csv");
        fs::write(&path, "").unwrap();
        let (mut monitor, _store) = monitor_for(dir.path());

        monitor.step();
        assert_eq!(monitor.phase(), Phase::AwaitFile);

        fs::write(&path, format!("{HEADER}\n")).unwrap();
        monitor.step();
        assert_eq!(monitor.phase(), Phase::HeadersRead);
    }

    #[test]
    fn short_and_header_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.csv");
        fs::write(&path, format!("{HEADER}\n")).unwrap();
        let (mut monitor, store) = monitor_for(dir.path());
        step_until(&mut monitor, Phase::Tailing, 3);

        // Only the header is in the window.
        monitor.step();
        assert_eq!(store.read().raw.status, Status::Starting);

        fs::write(&path, format!("{HEADER}\n1,2\n")).unwrap();
        monitor.step();
        assert_eq!(store.read().raw.status, Status::Starting);
        assert_eq!(monitor.phase(), Phase::Tailing);
        assert_eq!(monitor.records(), 0);
    }

    #[test]
    fn rotation_resumes_live() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.csv");
        fs::write(
            &path,
            format!("{HEADER}\n55.2,45.1,30.0,8192,50.0\n56.0,45.0,31.0,8192,50.0\n"),
        )
        .unwrap();
        let (mut monitor, store) = monitor_for(dir.path());
        step_until(&mut monitor, Phase::Tailing, 3);
        monitor.step();
        assert_eq!(store.read().cpu.usage, Some(56.0));

        // Truncated and restarted by the producer, shorter than before.
        fs::write(&path, format!("{HEADER}\n1,2,3,4,5\n")).unwrap();
        monitor.step();
        assert_eq!(monitor.phase(), Phase::AwaitFile);

        step_until(&mut monitor, Phase::Tailing, 3);
        monitor.step();
        let snap = store.read();
        assert_eq!(snap.raw.status, Status::Live);
        assert_eq!(snap.cpu.usage, Some(1.0));
        assert_eq!(snap.ram.usage_percent, Some(5.0));
    }

    #[cfg(unix)]
    #[test]
    fn rotation_to_new_file_remaps_headers() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("1.csv");
        fs::write(&first, format!("{HEADER}\n10,1,1,1,1\n")).unwrap();
        let (mut monitor, store) = monitor_for(dir.path());
        step_until(&mut monitor, Phase::Tailing, 3);
        monitor.step();
        assert_eq!(store.read().cpu.usage, Some(10.0));

        // Producer restarted with a new file and a different column order.
        fs::remove_file(&first).unwrap();
        let second = dir.path().join("2.csv");
        fs::write(&second, "GPU Core Load;Total CPU Usage;X\n12,5;33,3;0\n").unwrap();

        monitor.step();
        assert_eq!(monitor.phase(), Phase::AwaitFile);
        step_until(&mut monitor, Phase::Tailing, 3);
        monitor.step();

        let snap = store.read();
        assert_eq!(snap.gpu.usage, Some(12.5));
        assert_eq!(snap.cpu.usage, Some(33.3));
        assert_eq!(snap.raw.source, Some(second.display().to_string()));
    }

    #[test]
    fn unreadable_header_stops_monitor() {
        let mut fs = MockFs::new();
        // Listed by the locator but absent on disk.
        fs.add_file("/nonexistent/hwtail/1.csv", 1);
        let store = SnapshotStore::new();
        let config = MonitorConfig::new(LogSource::directory("/nonexistent/hwtail"));
        let mut monitor = Monitor::new(fs, config, store.clone());

        assert_eq!(monitor.step(), None);
        assert_eq!(monitor.phase(), Phase::Stopped);
        assert_eq!(monitor.step(), None);

        let snap = store.read();
        assert_eq!(snap.raw.status, Status::Error);
        assert!(snap.raw.message.as_deref().unwrap().contains("1.csv"));
    }

    #[test]
    fn recovering_returns_to_await_file() {
        let mut monitor = Monitor::new(
            MockFs::new(),
            MonitorConfig::default(),
            SnapshotStore::new(),
        );
        monitor.state = State::HeadersRead {
            path: PathBuf::from("/nonexistent/hwtail/1.csv"),
            layout: LogLayout::from_header_line(HEADER),
        };

        assert_eq!(monitor.step(), Some(Duration::from_secs(1)));
        assert_eq!(monitor.phase(), Phase::Recovering);
        assert_eq!(monitor.store.read().raw.status, Status::Error);

        assert_eq!(monitor.step(), Some(Duration::ZERO));
        assert_eq!(monitor.phase(), Phase::AwaitFile);
    }

    #[test]
    fn spawned_monitor_publishes_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new();
        let mut config = MonitorConfig::new(LogSource::directory(dir.path()))
            .with_interval(Duration::from_millis(10));
        config.locate_interval = Duration::from_millis(10);

        let handle = Monitor::new(RealFs::new(), config, store.clone())
            .spawn()
            .unwrap();
        fs::write(
            dir.path().join("1.csv"),
            format!("{HEADER}\n55.2,45.1,30.0,8192,50.0\n"),
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while store.read().raw.status != Status::Live && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(store.read().raw.status, Status::Live);
        assert!(!handle.is_finished());

        let started = Instant::now();
        handle.shutdown();
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
