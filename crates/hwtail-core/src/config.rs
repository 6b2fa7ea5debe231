//! Monitor configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default delay between tail ticks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1500);

/// Default delay between attempts to locate the log file.
pub const DEFAULT_LOCATE_INTERVAL: Duration = Duration::from_secs(2);

/// Default pause after a transient I/O failure before reopening.
pub const DEFAULT_RECOVERY_BACKOFF: Duration = Duration::from_secs(1);

/// Default size of the trailing window read on every tick, in bytes.
/// Enough for the last one or two rows of a wide sensor log.
pub const DEFAULT_TAIL_WINDOW: u64 = 4096;

/// Default extension of log files searched in a directory.
pub const DEFAULT_EXTENSION: &str = "csv";

/// Default directory searched for log files.
pub const DEFAULT_LOG_DIR: &str = "log-here";

/// Where the log file comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSource {
    /// Newest file with the given extension (case-insensitive) in `dir`.
    Directory { dir: PathBuf, extension: String },
    /// A fixed path.
    File(PathBuf),
}

impl LogSource {
    /// Directory source with the default `csv` extension.
    pub fn directory(dir: impl Into<PathBuf>) -> Self {
        LogSource::Directory {
            dir: dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Path shown in logs and errors: the directory or the fixed file.
    pub fn location(&self) -> &PathBuf {
        match self {
            LogSource::Directory { dir, .. } => dir,
            LogSource::File(path) => path,
        }
    }
}

impl Default for LogSource {
    fn default() -> Self {
        LogSource::directory(DEFAULT_LOG_DIR)
    }
}

/// Settings of the monitor state machine.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub source: LogSource,
    /// Sleep at the top of every tail tick.
    pub interval: Duration,
    /// Sleep between locate attempts while no log file exists.
    pub locate_interval: Duration,
    /// Sleep after a transient I/O failure.
    pub recovery_backoff: Duration,
    /// Bytes read from the end of the file on every tick.
    pub tail_window: u64,
}

impl MonitorConfig {
    pub fn new(source: LogSource) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_tail_window(mut self, bytes: u64) -> Self {
        // A window shorter than a row would never contain a complete record.
        self.tail_window = bytes.max(64);
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            source: LogSource::default(),
            interval: DEFAULT_INTERVAL,
            locate_interval: DEFAULT_LOCATE_INTERVAL,
            recovery_backoff: DEFAULT_RECOVERY_BACKOFF,
            tail_window: DEFAULT_TAIL_WINDOW,
        }
    }
}
