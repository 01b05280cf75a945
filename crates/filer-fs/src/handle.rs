//! Gate file handle implementation.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use filer_core::callsite::CallSite;
use filer_core::error::{GateError, GateResult};
use filer_core::traits::FileBackend;
use tracing::{debug, warn};

use crate::backend::StdBackend;
use crate::gate::Shared;

/// One admitted slot, shared between the gate's registry and the file that holds it.
pub(crate) struct Slot<F> {
    id: u64,
    path: PathBuf,
    /// Set once the backend open succeeds.
    creator: OnceLock<CallSite>,
    file: Mutex<SlotFile<F>>,
}

enum SlotFile<F> {
    /// Reserved, backend open in progress.
    Pending,
    Open(F),
    /// Closed by the owning handle.
    Closed,
    /// Closed by shutdown.
    Revoked,
}

impl<F> Slot<F> {
    pub(crate) fn new(id: u64, path: PathBuf) -> Self {
        Self {
            id,
            path,
            creator: OnceLock::new(),
            file: Mutex::new(SlotFile::Pending),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn creator(&self) -> CallSite {
        self.creator.get().copied().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, SlotFile<F>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores the opened backend file. Hands the file back if shutdown
    /// revoked the slot while it was being opened.
    pub(crate) fn attach(&self, file: F, creator: CallSite) -> Result<(), F> {
        let mut state = self.lock();
        match *state {
            SlotFile::Pending => {
                *state = SlotFile::Open(file);
                let _ = self.creator.set(creator);
                Ok(())
            }
            _ => Err(file),
        }
    }

    /// Marks the slot revoked, returning the backend file if it was open.
    pub(crate) fn revoke(&self) -> Option<F> {
        match std::mem::replace(&mut *self.lock(), SlotFile::Revoked) {
            SlotFile::Open(file) => Some(file),
            _ => None,
        }
    }

    fn take_open(&self) -> Option<F> {
        let mut state = self.lock();
        if matches!(*state, SlotFile::Revoked) {
            return None;
        }
        match std::mem::replace(&mut *state, SlotFile::Closed) {
            SlotFile::Open(file) => Some(file),
            _ => None,
        }
    }

    fn is_open(&self) -> bool {
        matches!(*self.lock(), SlotFile::Open(_))
    }

    fn with_file<R>(&self, f: impl FnOnce(&mut F) -> io::Result<R>) -> io::Result<R> {
        match &mut *self.lock() {
            SlotFile::Open(file) => f(file),
            SlotFile::Revoked => Err(io::Error::other(GateError::Revoked(self.path.clone()))),
            SlotFile::Pending | SlotFile::Closed => Err(io::Error::other(GateError::InvalidHandle)),
        }
    }
}

/// A file admitted by a [`FileGate`](crate::FileGate).
///
/// Holds one of the gate's slots until [`close`](Self::close) is called.
/// Dropping an unclosed file closes it on a best-effort basis, logging any
/// error.
///
/// Once the gate's shutdown deadline passes, the backend file is closed from
/// under the handle: reads and writes then fail, and `close` reports
/// [`GateError::Revoked`].
pub struct GateFile<B: FileBackend = StdBackend> {
    slot: Option<Arc<Slot<B::File>>>,
    path: PathBuf,
    gate: Weak<Shared<B>>,
    backend: Arc<B>,
    temporary: bool,
}

impl<B: FileBackend> GateFile<B> {
    pub(crate) fn new(
        slot: Arc<Slot<B::File>>,
        gate: Weak<Shared<B>>,
        backend: Arc<B>,
        temporary: bool,
    ) -> Self {
        Self {
            path: slot.path().to_path_buf(),
            slot: Some(slot),
            gate,
            backend,
            temporary,
        }
    }

    /// Path the file was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file is deleted when closed.
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Where the file was opened, as recorded by the gate's creator tracker.
    pub fn creator(&self) -> CallSite {
        self.slot.as_ref().map(|slot| slot.creator()).unwrap_or_default()
    }

    /// Returns false once the file was closed by its owner or by shutdown.
    pub fn is_open(&self) -> bool {
        self.slot.as_ref().is_some_and(|slot| slot.is_open())
    }

    /// Runs `f` against the backend file.
    ///
    /// Fails with an [`io::Error`] wrapping a [`GateError`] if the file is no
    /// longer open.
    pub fn with_file<R>(&self, f: impl FnOnce(&mut B::File) -> io::Result<R>) -> io::Result<R> {
        match &self.slot {
            Some(slot) => slot.with_file(f),
            None => Err(io::Error::other(GateError::InvalidHandle)),
        }
    }

    /// Closes the backend file and gives the slot back to the gate.
    ///
    /// The slot is released even when the backend close fails. Temporary files
    /// are deleted afterwards; if both steps fail the error carries both causes.
    ///
    /// # Errors
    ///
    /// * `GateError::InvalidHandle` - the file was already closed
    /// * `GateError::Revoked` - shutdown closed the file first
    /// * `GateError::Io` - the backend close failed
    /// * `GateError::Remove` / `GateError::CloseAndRemove` - deleting a temporary file failed
    /// * `GateError::RemoveAfterShutdown` - the handle was revoked and deleting it failed
    pub fn close(&mut self) -> GateResult<()> {
        let slot = self.slot.take().ok_or(GateError::InvalidHandle)?;

        let closed = match slot.take_open() {
            Some(file) => self.backend.close(file).map_err(GateError::Io),
            None => Err(GateError::Revoked(self.path.clone())),
        };

        if let Some(gate) = self.gate.upgrade() {
            gate.release(slot.id());
        }

        if !self.temporary {
            return closed;
        }

        match (closed, self.backend.remove(&self.path)) {
            (closed, Ok(())) => closed,
            (Err(GateError::Io(close)), Err(remove)) => Err(GateError::CloseAndRemove {
                path: self.path.clone(),
                close,
                remove,
            }),
            (Err(revoked @ GateError::Revoked(_)), Err(source)) => {
                Err(GateError::RemoveAfterShutdown {
                    path: self.path.clone(),
                    cause: Box::new(revoked),
                    source,
                })
            }
            (_, Err(source)) => Err(GateError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl<B: FileBackend> Drop for GateFile<B> {
    fn drop(&mut self) {
        if self.slot.is_none() {
            return;
        }
        match self.close() {
            Ok(()) => debug!(file.path = %self.path.display(), "closed gate file on drop"),
            Err(GateError::Revoked(_)) => {}
            Err(e) => warn!(file.path = %self.path.display(), error = %e, "failed to close gate file on drop"),
        }
    }
}

impl<B: FileBackend> fmt::Debug for GateFile<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateFile")
            .field("path", &self.path)
            .field("temporary", &self.temporary)
            .field("open", &self.is_open())
            .finish()
    }
}

impl<B> Read for GateFile<B>
where
    B: FileBackend,
    B::File: Read,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.with_file(|file| file.read(buf))
    }
}

impl<B> Write for GateFile<B>
where
    B: FileBackend,
    B::File: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}

impl<B> Seek for GateFile<B>
where
    B: FileBackend,
    B::File: Seek,
{
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.with_file(|file| file.seek(pos))
    }
}
