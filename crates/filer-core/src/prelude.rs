//! Convenience prelude for gate types.

pub use crate::callsite::{CallSite, CallerLocation, CreatorTracker, NoCreatorTracking};
pub use crate::error::{GateError, GateResult};
pub use crate::mode::OpenMode;
pub use crate::timeout::{Deadline, Timeout};
pub use crate::traits::FileBackend;
