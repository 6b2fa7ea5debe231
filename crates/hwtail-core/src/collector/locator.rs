//! Discovery of the active log file.

use std::path::PathBuf;
use std::time::SystemTime;

use tracing::trace;

use crate::collector::traits::FileSystem;
use crate::config::LogSource;
use crate::error::TailError;

/// Finds the log file to tail.
///
/// For a directory source, the most recently modified file with the configured
/// extension wins; ties are broken arbitrarily. A fixed path is returned as
/// long as it exists. A missing file or directory is
/// [`TailError::FileNotFound`], which callers treat as "poll again".
pub struct LogLocator<F: FileSystem> {
    fs: F,
    source: LogSource,
}

impl<F: FileSystem> LogLocator<F> {
    pub fn new(fs: F, source: LogSource) -> Self {
        Self { fs, source }
    }

    pub fn source(&self) -> &LogSource {
        &self.source
    }

    /// One lookup attempt.
    pub fn locate(&self) -> Result<PathBuf, TailError> {
        let not_found = || TailError::FileNotFound {
            location: self.source.location().clone(),
        };

        match &self.source {
            LogSource::File(path) => {
                if self.fs.is_file(path) {
                    Ok(path.clone())
                } else {
                    Err(not_found())
                }
            }
            LogSource::Directory { dir, extension } => {
                let entries = self.fs.read_dir(dir).map_err(|_| not_found())?;

                let mut newest: Option<(SystemTime, PathBuf)> = None;
                for path in entries {
                    if !has_extension(&path, extension) || !self.fs.is_file(&path) {
                        continue;
                    }
                    // The file may vanish between listing and stat.
                    let Ok(mtime) = self.fs.modified(&path) else {
                        continue;
                    };
                    trace!(path = %path.display(), ?mtime, "candidate log file");
                    if newest.as_ref().is_none_or(|(best, _)| mtime > *best) {
                        newest = Some((mtime, path));
                    }
                }

                newest.map(|(_, path)| path).ok_or_else(not_found)
            }
        }
    }
}

fn has_extension(path: &std::path::Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use std::path::Path;

    fn dir_source(dir: &str) -> LogSource {
        LogSource::directory(dir)
    }

    #[test]
    fn newest_csv_wins() {
        let mut fs = MockFs::new();
        fs.add_file("/logs/old.csv", 100);
        fs.add_file("/logs/new.CSV", 300);
        fs.add_file("/logs/mid.csv", 200);
        fs.add_file("/logs/newer.txt", 400);

        let locator = LogLocator::new(fs, dir_source("/logs"));
        assert_eq!(locator.locate().unwrap(), PathBuf::from("/logs/new.CSV"));
    }

    #[test]
    fn subdirectories_are_ignored() {
        let mut fs = MockFs::new();
        fs.add_dir("/logs/archive.csv");
        fs.add_file("/logs/archive.csv/x.csv", 500);
        fs.add_file("/logs/1.csv", 10);

        let locator = LogLocator::new(fs, dir_source("/logs"));
        assert_eq!(locator.locate().unwrap(), PathBuf::from("/logs/1.csv"));
    }

    #[test]
    fn empty_directory_is_not_found() {
        let mut fs = MockFs::new();
        fs.add_dir("/logs");
        fs.add_file("/logs/readme.md", 1);

        let locator = LogLocator::new(fs, dir_source("/logs"));
        let err = locator.locate().unwrap_err();
        assert!(matches!(err, TailError::FileNotFound { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn missing_directory_is_not_found() {
        let locator = LogLocator::new(MockFs::new(), dir_source("/logs"));
        assert!(matches!(
            locator.locate(),
            Err(TailError::FileNotFound { .. })
        ));
    }

    #[test]
    fn fixed_path() {
        let mut fs = MockFs::new();
        fs.add_file("/hw/1.CSV", 1);
        let locator = LogLocator::new(fs.clone(), LogSource::File("/hw/1.CSV".into()));
        assert_eq!(locator.locate().unwrap(), Path::new("/hw/1.CSV"));

        let locator = LogLocator::new(fs, LogSource::File("/hw/2.CSV".into()));
        assert!(locator.locate().is_err());
    }

    #[test]
    fn custom_extension() {
        let mut fs = MockFs::new();
        fs.add_file("/logs/a.csv", 10);
        fs.add_file("/logs/b.log", 5);
        let source = LogSource::Directory {
            dir: "/logs".into(),
            extension: "log".into(),
        };
        let locator = LogLocator::new(fs, source);
        assert_eq!(locator.locate().unwrap(), PathBuf::from("/logs/b.log"));
    }

    #[test]
    fn real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.csv");
        let new = dir.path().join("new.csv");
        std::fs::write(&old, "a").unwrap();
        std::fs::write(&new, "b").unwrap();
        let past = SystemTime::now() - std::time::Duration::from_secs(3600);
        std::fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(past)
            .unwrap();

        let locator = LogLocator::new(
            crate::collector::RealFs::new(),
            LogSource::directory(dir.path()),
        );
        assert_eq!(locator.locate().unwrap(), new);
    }
}
