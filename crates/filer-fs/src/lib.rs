//! File system backend and admission gate for bounded file handles.

pub mod backend;
pub mod gate;
pub mod handle;
pub mod limit;
mod name;
pub mod provider;

pub use backend::StdBackend;
pub use gate::{FileGate, GateStats, MAX_TEMP_ATTEMPTS};
pub use handle::GateFile;
pub use provider::{DiagnosticSink, FileGateBuilder};
