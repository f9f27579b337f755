//! Typed filesystem failures.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use sono_core::error::{AppError, ErrorKind};

/// Result alias for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;

/// A failure raised by the filesystem adapter or archive codec.
#[derive(Debug, Error)]
pub enum FsError {
    /// A required path does not exist.
    #[error("'{}' does not exist", .0.display())]
    NotFound(PathBuf),
    /// A path that must be free is already taken.
    #[error("'{}' already exists", .0.display())]
    AlreadyExists(PathBuf),
    /// A path that must be a directory is not one.
    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
    /// The file cannot be read as a zip archive.
    #[error("'{}' is not a valid archive", .path.display())]
    InvalidArchive {
        /// The offending file.
        path: PathBuf,
        /// Why the archive was rejected.
        #[source]
        source: zip::result::ZipError,
    },
    /// Any other I/O failure.
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// Path being operated on.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// Reading or writing archive entries failed.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// A blocking archive task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl FsError {
    /// Classify an `io::Error` raised while operating on `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path),
            _ => Self::Io { path, source },
        }
    }
}

impl From<FsError> for AppError {
    fn from(err: FsError) -> Self {
        match err {
            FsError::NotFound(_) => AppError::not_found(err.to_string()),
            FsError::AlreadyExists(_) | FsError::NotADirectory(_) => {
                AppError::conflict(err.to_string())
            }
            FsError::InvalidArchive { .. } => AppError::validation(err.to_string()),
            other => AppError::with_source(ErrorKind::Storage, other.to_string(), other),
        }
    }
}
