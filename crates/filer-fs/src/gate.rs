//! Admission gate bounding the number of concurrently open files.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use filer_core::callsite::CreatorTracker;
use filer_core::error::{GateError, GateResult};
use filer_core::mode::OpenMode;
use filer_core::timeout::Deadline;
use filer_core::traits::FileBackend;
use tokio::sync::Notify;
use tracing::{Span, debug, info, instrument, warn};

use crate::backend::StdBackend;
use crate::handle::{GateFile, Slot};
use crate::name::{TempNames, temp_file_path};
use crate::provider::{DiagnosticSink, FileGateBuilder};

/// Number of fresh names `temp_file` tries before giving up.
pub const MAX_TEMP_ATTEMPTS: usize = 1000;

/// Snapshot of a gate's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateStats {
    /// Maximum number of files admitted at once.
    pub limit: usize,
    /// Files currently holding a slot.
    pub admitted: usize,
    /// Highest `admitted` value observed.
    pub peak: usize,
    /// Slots handed out since the gate was built.
    pub total_admitted: u64,
    /// Whether shutdown has begun.
    pub shutting_down: bool,
}

struct State<F> {
    admitted: HashMap<u64, Arc<Slot<F>>>,
    next_id: u64,
    shutting_down: bool,
    names: TempNames,
    peak: usize,
    total_admitted: u64,
}

impl<F> State<F> {
    fn new() -> Self {
        Self {
            admitted: HashMap::new(),
            next_id: 0,
            shutting_down: false,
            names: TempNames::default(),
            peak: 0,
            total_admitted: 0,
        }
    }

    /// Reserves a slot for `path`, or returns `Ok(None)` if all slots are taken.
    fn try_reserve(&mut self, limit: usize, path: &Path) -> GateResult<Option<Arc<Slot<F>>>> {
        if self.shutting_down {
            return Err(GateError::Cancelled);
        }
        if self.admitted.len() >= limit {
            return Ok(None);
        }
        self.next_id += 1;
        let slot = Arc::new(Slot::new(self.next_id, path.to_path_buf()));
        self.admitted.insert(slot.id(), Arc::clone(&slot));
        self.total_admitted += 1;
        self.peak = self.peak.max(self.admitted.len());
        Ok(Some(slot))
    }
}

/// State shared by a gate and the files it admitted.
pub(crate) struct Shared<B: FileBackend> {
    backend: Arc<B>,
    limit: usize,
    temp_dir: PathBuf,
    state: Mutex<State<B::File>>,
    /// Signalled once per released slot.
    slot_freed: Notify,
    /// Broadcast on every release so a draining shutdown can re-check.
    drained: Notify,
    diagnostics: Option<DiagnosticSink>,
    tracker: Arc<dyn CreatorTracker>,
}

impl<B: FileBackend> Shared<B> {
    pub(crate) fn new(
        backend: B,
        limit: usize,
        temp_dir: PathBuf,
        diagnostics: Option<DiagnosticSink>,
        tracker: Arc<dyn CreatorTracker>,
    ) -> Self {
        Self {
            backend: Arc::new(backend),
            limit,
            temp_dir,
            state: Mutex::new(State::new()),
            slot_freed: Notify::new(),
            drained: Notify::new(),
            diagnostics,
            tracker,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, State<B::File>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes a slot from the registry and wakes one blocked admitter.
    ///
    /// Releasing a slot that shutdown already removed is a no-op.
    pub(crate) fn release(&self, id: u64) {
        let released = self.lock_state().admitted.remove(&id).is_some();
        if released {
            debug!(slot = id, "released file slot");
            self.slot_freed.notify_one();
        }
        self.drained.notify_waiters();
    }

    fn report(&self, message: &str) {
        if let Some(sink) = &self.diagnostics {
            sink(message);
        }
    }
}

/// Bounds how many files may be open at once.
///
/// Opening a file reserves one of `limit` slots, waiting for a slot to free
/// up if necessary. Closing the returned [`GateFile`] gives the slot back.
/// Cloning a gate is cheap; clones share the same slots.
///
/// # Example
///
/// ```rust,no_run
/// use filer_fs::FileGate;
/// use std::io::Read;
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let gate = FileGate::new(64);
///
/// let mut file = gate.open("/etc/hostname").await?;
/// let mut contents = String::new();
/// file.read_to_string(&mut contents)?;
/// file.close()?;
///
/// gate.shutdown(Some(Duration::from_secs(5))).await?;
/// # Ok(())
/// # }
/// ```
pub struct FileGate<B: FileBackend = StdBackend> {
    shared: Arc<Shared<B>>,
}

impl<B: FileBackend> Clone for FileGate<B> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl FileGate<StdBackend> {
    /// Creates a gate over the OS file system admitting at most `limit` files.
    ///
    /// A limit of 0 derives one from the process open-file ceiling.
    pub fn new(limit: usize) -> Self {
        Self::builder().limit(limit).build()
    }

    /// Returns a new builder for configuring a gate.
    pub fn builder() -> FileGateBuilder<StdBackend> {
        FileGateBuilder::new()
    }
}

impl<B: FileBackend> FileGate<B> {
    pub(crate) fn from_shared(shared: Shared<B>) -> Self {
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Maximum number of concurrently admitted files.
    pub fn limit(&self) -> usize {
        self.shared.limit
    }

    /// Directory `temp_file` uses when called with an empty directory.
    pub fn temp_dir(&self) -> &Path {
        &self.shared.temp_dir
    }

    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shared.lock_state().shutting_down
    }

    pub fn stats(&self) -> GateStats {
        let state = self.shared.lock_state();
        GateStats {
            limit: self.shared.limit,
            admitted: state.admitted.len(),
            peak: state.peak,
            total_admitted: state.total_admitted,
            shutting_down: state.shutting_down,
        }
    }

    /// Opens `path` for reading, waiting for a free slot if necessary.
    ///
    /// # Errors
    ///
    /// * `GateError::Cancelled` - the gate is shutting down
    /// * `GateError::Io` - the backend could not open the file
    #[track_caller]
    pub fn open(
        &self,
        path: impl AsRef<Path>,
    ) -> impl Future<Output = GateResult<GateFile<B>>> + Send + '_ {
        self.open_file(path, &OpenMode::read_only())
    }

    /// Opens `path` with the given flags and permissions, waiting for a free
    /// slot if necessary.
    #[track_caller]
    pub fn open_file(
        &self,
        path: impl AsRef<Path>,
        mode: &OpenMode,
    ) -> impl Future<Output = GateResult<GateFile<B>>> + Send + '_ {
        let caller = Location::caller();
        let path = path.as_ref().to_path_buf();
        let mode = *mode;
        async move { self.open_tracked(path, mode, caller, false).await }
    }

    /// Opens `path` only if a slot is free right now.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(file))` - a slot was free and the file opened
    /// * `Ok(None)` - every slot is taken
    /// * `Err(...)` - the gate is shutting down or the backend open failed
    #[track_caller]
    pub fn try_open(
        &self,
        path: impl AsRef<Path>,
        mode: &OpenMode,
    ) -> GateResult<Option<GateFile<B>>> {
        let caller = Location::caller();
        let path = path.as_ref();
        let reserved = self.shared.lock_state().try_reserve(self.shared.limit, path)?;
        match reserved {
            Some(slot) => self.open_reserved(slot, mode, caller, false).map(Some),
            None => Ok(None),
        }
    }

    /// Creates a new file named `prefix` + random hex + `suffix` in `dir` and
    /// opens it for reading and writing.
    ///
    /// An empty `dir` means the gate's temp directory. Names that already
    /// exist are retried with a fresh name, up to [`MAX_TEMP_ATTEMPTS`] times,
    /// after which the last error is returned. The file is deleted when closed.
    #[track_caller]
    pub fn temp_file(
        &self,
        dir: impl AsRef<Path>,
        prefix: &str,
        suffix: &str,
    ) -> impl Future<Output = GateResult<GateFile<B>>> + Send + '_ {
        let caller = Location::caller();
        let dir = match dir.as_ref() {
            d if d.as_os_str().is_empty() => self.shared.temp_dir.clone(),
            d => d.to_path_buf(),
        };
        let prefix = prefix.to_owned();
        let suffix = suffix.to_owned();
        async move {
            let mode = OpenMode::exclusive_create();
            let mut last_collision = None;
            for _ in 0..MAX_TEMP_ATTEMPTS {
                let token = self.shared.lock_state().names.next_token();
                let path = temp_file_path(&dir, &prefix, &token, &suffix);
                match self.open_tracked(path, mode, caller, true).await {
                    Err(GateError::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => {
                        last_collision = Some(e);
                    }
                    result => return result,
                }
            }
            Err(GateError::Io(last_collision.unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::AlreadyExists, "no temporary file name available")
            })))
        }
    }

    #[instrument(
        skip(self, path, mode, caller),
        fields(file.path = %path.display(), backend = "gate", opened = tracing::field::Empty)
    )]
    async fn open_tracked(
        &self,
        path: PathBuf,
        mode: OpenMode,
        caller: &'static Location<'static>,
        temporary: bool,
    ) -> GateResult<GateFile<B>> {
        let slot = self.admit(&path).await?;
        let result = self.open_reserved(slot, &mode, caller, temporary);
        Span::current().record("opened", result.is_ok());
        result
    }

    /// Waits until a slot is free or shutdown begins.
    async fn admit(&self, path: &Path) -> GateResult<Arc<Slot<B::File>>> {
        loop {
            // Register for the wake-up before checking, so a release between
            // the check and the await is not missed.
            let freed = self.shared.slot_freed.notified();
            tokio::pin!(freed);
            freed.as_mut().enable();

            let reserved = self.shared.lock_state().try_reserve(self.shared.limit, path)?;
            if let Some(slot) = reserved {
                debug!(slot = slot.id(), "admitted file");
                return Ok(slot);
            }
            freed.await;
        }
    }

    /// Opens the backend file for an already reserved slot.
    fn open_reserved(
        &self,
        slot: Arc<Slot<B::File>>,
        mode: &OpenMode,
        caller: &'static Location<'static>,
        temporary: bool,
    ) -> GateResult<GateFile<B>> {
        let file = match self.shared.backend.open(slot.path(), mode) {
            Ok(file) => file,
            Err(e) => {
                self.shared.release(slot.id());
                return Err(GateError::Io(e));
            }
        };

        let creator = self.shared.tracker.track(caller);
        if let Err(file) = slot.attach(file, creator) {
            // Shutdown revoked the reservation while the backend was opening.
            if let Err(e) = self.shared.backend.close(file) {
                warn!(file.path = %slot.path().display(), error = %e, "failed to close file opened during shutdown");
            }
            if temporary {
                if let Err(source) = self.shared.backend.remove(slot.path()) {
                    warn!(file.path = %slot.path().display(), error = %source, "failed to remove temporary file opened during shutdown");
                    return Err(GateError::RemoveAfterShutdown {
                        path: slot.path().to_path_buf(),
                        cause: Box::new(GateError::Cancelled),
                        source,
                    });
                }
            }
            return Err(GateError::Cancelled);
        }

        Ok(GateFile::new(
            slot,
            Arc::downgrade(&self.shared),
            Arc::clone(&self.shared.backend),
            temporary,
        ))
    }

    /// Shuts the gate down.
    ///
    /// Admission fails with `GateError::Cancelled` from now on, including for
    /// callers currently waiting for a slot. Files already open keep working
    /// until `timeout` expires; any still open then are closed by the gate and
    /// reported through the diagnostics callback. `None` waits indefinitely.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - every file was closed by its owner in time
    /// * `Err(GateError::DeadlineExceeded)` - the deadline passed first
    #[instrument(skip(self), fields(backend = "gate", forced = tracing::field::Empty))]
    pub async fn shutdown(&self, timeout: Option<Duration>) -> GateResult<()> {
        let deadline = Deadline::after(timeout);
        self.shared.lock_state().shutting_down = true;
        self.shared.slot_freed.notify_waiters();
        info!("file gate shutting down");

        let forced = loop {
            let drained = self.shared.drained.notified();
            tokio::pin!(drained);
            drained.as_mut().enable();

            let (still_open, forced) = {
                let mut state = self.shared.lock_state();
                if deadline.is_elapsed() {
                    (state.admitted.drain().map(|(_, slot)| slot).collect::<Vec<_>>(), true)
                } else if state.admitted.is_empty() {
                    break false;
                } else {
                    (state.admitted.values().cloned().collect(), false)
                }
            };

            if forced {
                for slot in still_open {
                    let message = format!(
                        "FileGate::shutdown: closing file created by {}: {}",
                        slot.creator(),
                        slot.path().display()
                    );
                    warn!("{message}");
                    self.shared.report(&message);
                    if let Some(file) = slot.revoke() {
                        if let Err(e) = self.shared.backend.close(file) {
                            warn!(file.path = %slot.path().display(), error = %e, "force close failed");
                        }
                    }
                }
                break true;
            }

            if self.shared.diagnostics.is_some() {
                for slot in &still_open {
                    self.shared.report(&format!(
                        "FileGate::shutdown: waiting for file created by {}: {}",
                        slot.creator(),
                        slot.path().display()
                    ));
                }
            }

            // Wake on the next release, or when the deadline passes.
            match deadline.remaining() {
                Some(left) => {
                    let _ = tokio::time::timeout(left, drained).await;
                }
                None => drained.await,
            }
        };

        Span::current().record("forced", forced);
        if forced {
            Err(GateError::DeadlineExceeded(deadline.budget()))
        } else {
            Ok(())
        }
    }
}
