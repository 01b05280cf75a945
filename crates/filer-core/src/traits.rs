//! Core traits for gated file access.

use std::io;
use std::path::Path;

use crate::mode::OpenMode;

// ============================================================================
// File Backend Trait
// ============================================================================

/// The OS-level file operations a gate delegates to.
///
/// The gate only decides *how many* files may be open at once; opening,
/// closing, and deleting are left to the backend. Every method is called
/// without any gate lock held.
///
/// # Example
///
/// ```rust,ignore
/// struct LoggingBackend(StdBackend);
///
/// impl FileBackend for LoggingBackend {
///     type File = std::fs::File;
///
///     fn open(&self, path: &Path, mode: &OpenMode) -> io::Result<Self::File> {
///         println!("open {}", path.display());
///         self.0.open(path, mode)
///     }
///     // ...
/// }
/// ```
pub trait FileBackend: Send + Sync + 'static {
    /// The open file resource owned by a gate file.
    type File: Send + 'static;

    /// Opens `path` according to `mode`.
    ///
    /// An [`io::ErrorKind::AlreadyExists`] error from an exclusive create is
    /// what makes temporary file creation retry with a fresh name.
    fn open(&self, path: &Path, mode: &OpenMode) -> io::Result<Self::File>;

    /// Closes a file, reporting any error the OS returns.
    fn close(&self, file: Self::File) -> io::Result<()>;

    /// Deletes the file at `path`.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// The process-wide ceiling on open files, if the backend can tell.
    fn open_file_ceiling(&self) -> Option<u64> {
        None
    }
}
