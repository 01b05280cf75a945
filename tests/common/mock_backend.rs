//! In-memory file backend for testing gate behaviour.

#![allow(dead_code)]

use filer_core::mode::OpenMode;
use filer_core::traits::FileBackend;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// Mock open file.
#[derive(Debug)]
pub struct MockFile {
    pub path: PathBuf,
}

#[derive(Default)]
struct MockState {
    existing: HashSet<PathBuf>,
    open: HashSet<PathBuf>,
    closed: Vec<PathBuf>,
    removed: Vec<PathBuf>,
    open_calls: usize,
    /// Exclusive creates that fail with AlreadyExists before one succeeds.
    collisions: usize,
    fail_open: bool,
    fail_close: bool,
    fail_remove: bool,
    /// Next open signals the first sender, then blocks until the receiver fires.
    hold: Option<(Sender<()>, Receiver<()>)>,
}

/// Mock backend recording every call; clones share state.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    ceiling: Option<u64>,
}

impl MockBackend {
    /// Creates a new mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ceiling(ceiling: u64) -> Self {
        Self {
            ceiling: Some(ceiling),
            ..Self::default()
        }
    }

    pub fn add_file(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().existing.insert(path.into());
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.state.lock().unwrap().existing.contains(path)
    }

    pub fn is_open(&self, path: &Path) -> bool {
        self.state.lock().unwrap().open.contains(path)
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().unwrap().open.len()
    }

    pub fn open_calls(&self) -> usize {
        self.state.lock().unwrap().open_calls
    }

    pub fn closed(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().closed.clone()
    }

    pub fn removed(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().removed.clone()
    }

    pub fn set_collisions(&self, collisions: usize) {
        self.state.lock().unwrap().collisions = collisions;
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.state.lock().unwrap().fail_open = fail;
    }

    pub fn set_fail_close(&self, fail: bool) {
        self.state.lock().unwrap().fail_close = fail;
    }

    pub fn set_fail_remove(&self, fail: bool) {
        self.state.lock().unwrap().fail_remove = fail;
    }

    /// Makes the next `open` block inside the backend.
    ///
    /// Returns a receiver that fires once the open has started, and a sender
    /// that lets it finish.
    pub fn hold_next_open(&self) -> (Receiver<()>, Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        self.state.lock().unwrap().hold = Some((started_tx, release_rx));
        (started_rx, release_tx)
    }
}

impl FileBackend for MockBackend {
    type File = MockFile;

    fn open(&self, path: &Path, mode: &OpenMode) -> io::Result<MockFile> {
        let hold = self.state.lock().unwrap().hold.take();
        if let Some((started, release)) = hold {
            let _ = started.send(());
            let _ = release.recv();
        }

        let mut state = self.state.lock().unwrap();
        state.open_calls += 1;
        if state.fail_open {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "mock open failure"));
        }
        if mode.create_new {
            if state.collisions > 0 {
                state.collisions -= 1;
                return Err(io::Error::new(io::ErrorKind::AlreadyExists, "mock collision"));
            }
            if state.existing.contains(path) {
                return Err(io::Error::new(io::ErrorKind::AlreadyExists, "file exists"));
            }
            state.existing.insert(path.to_path_buf());
        } else if !state.existing.contains(path) {
            if !mode.create {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
            }
            state.existing.insert(path.to_path_buf());
        }
        state.open.insert(path.to_path_buf());
        Ok(MockFile {
            path: path.to_path_buf(),
        })
    }

    fn close(&self, file: MockFile) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.open.remove(&file.path);
        state.closed.push(file.path);
        if state.fail_close {
            return Err(io::Error::new(io::ErrorKind::Other, "mock close failure"));
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_remove {
            return Err(io::Error::new(io::ErrorKind::Other, "mock remove failure"));
        }
        state.existing.remove(path);
        state.removed.push(path.to_path_buf());
        Ok(())
    }

    fn open_file_ceiling(&self) -> Option<u64> {
        self.ceiling
    }
}
