//! Operating system file backend.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use filer_core::mode::OpenMode;
use filer_core::traits::FileBackend;

use crate::limit::open_file_ceiling;

/// Backend that opens real files with [`std::fs`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StdBackend;

impl StdBackend {
    pub const fn new() -> Self {
        Self
    }

    fn options(mode: &OpenMode) -> OpenOptions {
        let mut options = OpenOptions::new();
        options
            .read(mode.read)
            .write(mode.write)
            .append(mode.append)
            .truncate(mode.truncate)
            .create(mode.create)
            .create_new(mode.create_new);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode.permissions);
        }
        options
    }
}

impl FileBackend for StdBackend {
    type File = File;

    fn open(&self, path: &Path, mode: &OpenMode) -> io::Result<File> {
        Self::options(mode).open(path)
    }

    #[cfg(unix)]
    fn close(&self, file: File) -> io::Result<()> {
        use std::os::unix::io::IntoRawFd;

        // Dropping a File discards close(2) errors, so close the descriptor directly.
        let fd = file.into_raw_fd();
        // SAFETY: fd was just released by `into_raw_fd` and is owned by nobody else.
        if unsafe { libc::close(fd) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn close(&self, file: File) -> io::Result<()> {
        drop(file);
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn open_file_ceiling(&self) -> Option<u64> {
        open_file_ceiling()
    }
}
