//! Error taxonomy of the log tailer.
//!
//! Every variant except [`TailError::HeaderRead`] is recoverable: the monitor
//! steps back to an earlier state and keeps going. Field-level parse failures
//! are not errors at all, the normalizer substitutes `None`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while locating, mapping or tailing the log file.
#[derive(Debug, Error)]
pub enum TailError {
    /// No matching log file exists yet. Poll again later.
    #[error("no log file found at {}", .location.display())]
    FileNotFound { location: PathBuf },

    /// The header line could not be read. Schema discovery is impossible,
    /// so the monitor stops.
    #[error("failed to read header of {}: {source}", .path.display())]
    HeaderRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but has no header line yet (just created or truncated).
    #[error("header line of {} is empty", .path.display())]
    EmptyHeader { path: PathBuf },

    /// The file shrank below the last observed end, disappeared, or was replaced.
    #[error("{} rotated: {reason}", .path.display())]
    Rotated { path: PathBuf, reason: String },

    /// Transient I/O failure while tailing. Close, back off, retry.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TailError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TailError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the monitor may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TailError::HeaderRead { .. })
    }
}
