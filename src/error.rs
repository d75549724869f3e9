//! Error types for confparse
//!
//! Every fallible operation returns [`Error`]. Callers that only care about
//! the broad class of failure can match on [`Error::kind`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    Usage(String),

    #[error("File {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    #[error("Key '{key}' not found in category '{category}'")]
    KeyNotFound { category: String, key: String },

    #[error("Filetype not supported: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Line {line} is too long ({len} bytes, max {max}): {preview}..")]
    LineTooLong {
        line: usize,
        len: usize,
        max: usize,
        preview: String,
    },

    #[error("Line {line}: only '#' is allowed to mark a comment: {preview}..")]
    ForbiddenComment { line: usize, preview: String },

    #[error("Too many entries: {count} (max {max})")]
    TooManyEntries { count: usize, max: usize },

    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid limits configuration: {0}")]
    Limits(String),
}

/// Broad failure classes callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad argument to an operation; nothing was touched
    Usage,
    /// Missing file, or missing key during an update
    NotFound,
    /// Extension outside the allow-list
    UnsupportedFormat,
    /// Oversized line, forbidden comment syntax, or too many entries
    Structural,
    /// Underlying filesystem failure
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Usage(_) | Error::Limits(_) => ErrorKind::Usage,
            Error::FileNotFound(_) | Error::KeyNotFound { .. } => ErrorKind::NotFound,
            Error::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Error::LineTooLong { .. }
            | Error::ForbiddenComment { .. }
            | Error::TooManyEntries { .. } => ErrorKind::Structural,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
