//! Creation-site tracking for shutdown diagnostics.

use std::fmt;
use std::panic::Location;

/// Where a gate file was created, as reported by a [`CreatorTracker`].
///
/// Only used to make shutdown reports readable; an unknown call site never
/// changes admission behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallSite(Option<&'static Location<'static>>);

impl CallSite {
    pub const UNKNOWN: Self = Self(None);

    pub fn new(location: &'static Location<'static>) -> Self {
        Self(Some(location))
    }

    pub fn location(&self) -> Option<&'static Location<'static>> {
        self.0
    }

    pub fn is_known(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(loc) => write!(f, "{}:{}:{}", loc.file(), loc.line(), loc.column()),
            None => f.write_str("<unknown>"),
        }
    }
}

/// Decides what creation site to record for a newly admitted file.
///
/// The gate captures the caller of its public open methods with
/// `#[track_caller]` and hands the location to the tracker.
pub trait CreatorTracker: Send + Sync {
    fn track(&self, caller: &'static Location<'static>) -> CallSite;
}

/// Records the source location of the code that opened the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallerLocation;

impl CreatorTracker for CallerLocation {
    fn track(&self, caller: &'static Location<'static>) -> CallSite {
        CallSite::new(caller)
    }
}

/// Records nothing; every file reports an unknown creator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCreatorTracking;

impl CreatorTracker for NoCreatorTracking {
    fn track(&self, _caller: &'static Location<'static>) -> CallSite {
        CallSite::UNKNOWN
    }
}
