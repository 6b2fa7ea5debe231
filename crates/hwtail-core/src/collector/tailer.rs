//! Bounded-window tailer for a growing log file.
//!
//! Keeps one read handle open. Every [`FileTailer::poll`] checks for rotation,
//! then reads a fixed number of bytes from the end of the file and returns the
//! last complete line. Cost per poll does not depend on file size.
//!
//! Rotation is detected by file size regression, by the path disappearing, or
//! by the path pointing at a different inode (Linux).

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::TailError;

/// Open read handle on the tracked log file.
///
/// On creation, seeks to the end of the file: nothing is replayed, each poll
/// only looks at the trailing window.
#[derive(Debug)]
pub struct FileTailer {
    path: PathBuf,
    file: File,
    /// End of file observed by the last read.
    offset: u64,
    inode: u64,
    window: u64,
}

impl FileTailer {
    /// Opens `path` and positions at its end.
    pub fn open_at_end(path: impl Into<PathBuf>, window: u64) -> Result<Self, TailError> {
        let path = path.into();
        let mut file = File::open(&path).map_err(|e| TailError::io(&path, e))?;
        let offset = file
            .seek(SeekFrom::End(0))
            .map_err(|e| TailError::io(&path, e))?;
        let inode = file
            .metadata()
            .map(|m| get_inode(&m))
            .map_err(|e| TailError::io(&path, e))?;

        Ok(Self {
            path,
            file,
            offset,
            inode,
            window,
        })
    }

    /// Checks for rotation, then returns the last complete line, if any.
    pub fn poll(&mut self) -> Result<Option<String>, TailError> {
        self.check_rotation()?;
        self.read_last_line()
    }

    /// Reads the trailing window and returns its last usable line.
    pub fn read_last_line(&mut self) -> Result<Option<String>, TailError> {
        let end = self
            .file
            .seek(SeekFrom::End(0))
            .map_err(|e| TailError::io(&self.path, e))?;
        let len = end.min(self.window);
        let start = end - len;

        let mut buf = vec![0u8; len as usize];
        self.read_window(start, &mut buf)
            .map_err(|e| TailError::io(&self.path, e))?;
        self.offset = end;

        let text = decode_window(&buf, start > 0);
        Ok(last_usable_line(&text).map(str::to_owned))
    }

    fn read_window(&mut self, start: u64, buf: &mut [u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(start))?;
        self.file.read_exact(buf)
    }

    fn check_rotation(&self) -> Result<(), TailError> {
        let size = self
            .file
            .metadata()
            .map_err(|e| TailError::io(&self.path, e))?
            .len();
        if size < self.offset {
            return Err(self.rotated(format!(
                "size {} below last offset {}",
                size, self.offset
            )));
        }

        match fs::metadata(&self.path) {
            Ok(m) if get_inode(&m) != self.inode => {
                Err(self.rotated("path now refers to a different file".to_string()))
            }
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(self.rotated("path no longer exists".to_string()))
            }
            Err(e) => Err(TailError::io(&self.path, e)),
        }
    }

    fn rotated(&self, reason: String) -> TailError {
        TailError::Rotated {
            path: self.path.clone(),
            reason,
        }
    }

    /// Returns the tracked file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// End of file as of the last read.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Decodes a window of raw bytes.
///
/// A window that starts mid-file begins with a partial line, possibly cut in
/// the middle of a multi-byte character. Everything up to the first newline is
/// dropped in that case. Remaining invalid sequences become U+FFFD.
fn decode_window(buf: &[u8], starts_mid_file: bool) -> Cow<'_, str> {
    let bytes = if starts_mid_file {
        match buf.iter().position(|&b| b == b'\n') {
            Some(pos) => &buf[pos + 1..],
            None => &buf[..0],
        }
    } else {
        buf
    };
    String::from_utf8_lossy(bytes)
}

/// Picks the line to parse from a decoded window.
///
/// The final segment when it has content (file does not end with a newline
/// yet), otherwise the segment before it. Trailing `\r` is removed.
pub fn last_usable_line(text: &str) -> Option<&str> {
    let mut segments = text.rsplit('\n');
    let last = segments.next()?;
    let line = if last.trim().is_empty() {
        segments.next()?
    } else {
        last
    };
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        None
    } else {
        Some(line)
    }
}

/// Extract inode from file metadata (Unix-specific).
#[cfg(unix)]
fn get_inode(metadata: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

/// Fallback for non-Unix: always returns 0, relying on size-based rotation detection.
#[cfg(not(unix))]
fn get_inode(_metadata: &fs::Metadata) -> u64 {
    0
}
