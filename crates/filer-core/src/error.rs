//! Error types for file gate operations.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while admitting, closing, or draining files.
#[derive(Error, Debug)]
pub enum GateError {
    /// Admission was refused because the gate is shutting down.
    #[error("file gate is shutting down")]
    Cancelled,

    /// Error reported by the file backend, passed through unchanged.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The handle was already closed.
    #[error("invalid file handle")]
    InvalidHandle,

    /// The backend file was force-closed by shutdown before its owner closed it.
    #[error("file '{}' was closed by shutdown", .0.display())]
    Revoked(PathBuf),

    /// Deleting a temporary file after close failed.
    #[error("failed to remove temporary file '{}': {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Both the backend close and the temporary file removal failed.
    #[error("failed to close '{}': {close} (removal also failed: {remove})", path.display())]
    CloseAndRemove {
        path: PathBuf,
        #[source]
        close: io::Error,
        remove: io::Error,
    },

    /// Shutdown took the file away, and deleting the temporary file then failed.
    ///
    /// `cause` is `Cancelled` when shutdown won the race with an open, and
    /// `Revoked` when the owner closed a handle shutdown had already closed.
    #[error("{cause}; failed to remove temporary file '{}': {source}", path.display())]
    RemoveAfterShutdown {
        path: PathBuf,
        cause: Box<GateError>,
        #[source]
        source: io::Error,
    },

    /// Shutdown did not drain every file before its deadline.
    #[error("shutdown deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
}

impl GateError {
    /// Returns true if the error came from admission during shutdown.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::RemoveAfterShutdown { cause, .. } => cause.is_cancelled(),
            _ => false,
        }
    }

    /// Returns true if the backend refused to create a file that already exists.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::AlreadyExists)
    }
}

/// Result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;
