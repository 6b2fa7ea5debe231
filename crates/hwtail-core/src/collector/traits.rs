//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait lets the log locator work with both the real
//! filesystem and an in-memory mock with controlled modification times.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Abstraction for the directory queries made while locating the log file.
pub trait FileSystem: Send + Sync {
    /// Lists entries in a directory.
    ///
    /// # Returns
    /// A vector of paths to entries in the directory, or an I/O error.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Last modification time of a file.
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    /// Checks if a path exists and is a regular file.
    fn is_file(&self, path: &Path) -> bool;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_fs_read_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), "x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let fs = RealFs::new();
        let mut entries = fs.read_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(entries.len(), 2);
        assert!(fs.is_file(&dir.path().join("a.csv")));
        assert!(!fs.is_file(&dir.path().join("sub")));
        assert!(fs.modified(&dir.path().join("a.csv")).is_ok());
    }

    #[test]
    fn test_real_fs_missing_dir() {
        let fs = RealFs::new();
        let err = fs.read_dir(Path::new("/nonexistent/hwtail/dir")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
