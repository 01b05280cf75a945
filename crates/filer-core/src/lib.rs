//! Core traits and types for bounded file handle admission.

pub mod callsite;
pub mod error;
pub mod mode;
pub mod prelude;
pub mod timeout;
pub mod traits;

pub use error::{GateError, GateResult};
pub use prelude::*;
