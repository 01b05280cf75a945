//! File gate configuration.

use std::path::PathBuf;
use std::sync::Arc;

use filer_core::callsite::{CallerLocation, CreatorTracker};
use filer_core::traits::FileBackend;
use tracing::debug;

use crate::backend::StdBackend;
use crate::gate::{FileGate, Shared};
use crate::limit::admission_limit;

/// Callback receiving formatted shutdown diagnostics.
pub type DiagnosticSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Builder for file gate configuration.
///
/// Everything is fixed once [`build`](Self::build) returns.
pub struct FileGateBuilder<B = StdBackend> {
    limit: usize,
    temp_dir: Option<PathBuf>,
    diagnostics: Option<DiagnosticSink>,
    tracker: Arc<dyn CreatorTracker>,
    backend: B,
}

impl FileGateBuilder<StdBackend> {
    /// Creates a new builder using the OS file system.
    pub fn new() -> Self {
        Self {
            limit: 0,
            temp_dir: None,
            diagnostics: None,
            tracker: Arc::new(CallerLocation),
            backend: StdBackend,
        }
    }
}

impl Default for FileGateBuilder<StdBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: FileBackend> FileGateBuilder<B> {
    /// Sets the maximum number of concurrently open files.
    ///
    /// 0 (the default) uses the backend's open-file ceiling minus 10%, or 90
    /// if the ceiling is unknown.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the default directory for temporary files.
    ///
    /// Defaults to [`std::env::temp_dir`].
    pub fn temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(path.into());
        self
    }

    /// Sets the callback that reports files still open during shutdown.
    pub fn diagnostics(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.diagnostics = Some(Arc::new(sink));
        self
    }

    /// Sets how the creator of each file is recorded.
    ///
    /// Use [`NoCreatorTracking`](filer_core::callsite::NoCreatorTracking) to
    /// skip it.
    pub fn creator_tracker(mut self, tracker: impl CreatorTracker + 'static) -> Self {
        self.tracker = Arc::new(tracker);
        self
    }

    /// Replaces the file backend.
    pub fn backend<C: FileBackend>(self, backend: C) -> FileGateBuilder<C> {
        FileGateBuilder {
            limit: self.limit,
            temp_dir: self.temp_dir,
            diagnostics: self.diagnostics,
            tracker: self.tracker,
            backend,
        }
    }

    /// Builds the gate.
    pub fn build(self) -> FileGate<B> {
        let limit = admission_limit(self.limit, self.backend.open_file_ceiling());
        let temp_dir = self.temp_dir.unwrap_or_else(std::env::temp_dir);
        debug!(limit, temp_dir = %temp_dir.display(), "building file gate");
        FileGate::from_shared(Shared::new(
            self.backend,
            limit,
            temp_dir,
            self.diagnostics,
            self.tracker,
        ))
    }
}
