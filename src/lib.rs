//! Bounded admission of operating system file handles.
//!
//! A [`FileGate`] lets many independent tasks open files without exceeding a
//! process-wide descriptor budget. Opening a file reserves one of the gate's
//! slots and waits when every slot is taken; closing the file frees the slot
//! and wakes one waiter. Shutting the gate down refuses new opens, waits for
//! open files to be closed, and closes whatever is left once a deadline passes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use filer::*;
//! use std::io::Write;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // At most 16 files open at once
//!     let gate = FileGate::new(16);
//!
//!     // A scratch file, deleted when closed
//!     let mut scratch = gate.temp_file("", "report-", ".csv").await?;
//!     writeln!(scratch, "id,total")?;
//!     scratch.close()?;
//!
//!     // Refuse new opens and give open files five seconds to close
//!     gate.shutdown(Some(Duration::from_secs(5))).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```rust,no_run
//! use filer::{FileGate, NoCreatorTracking};
//!
//! let gate = FileGate::builder()
//!     .limit(0) // derive from RLIMIT_NOFILE
//!     .temp_dir("/var/tmp/myapp")
//!     .diagnostics(|msg| eprintln!("{msg}"))
//!     .creator_tracker(NoCreatorTracking)
//!     .build();
//! ```
//!
//! # Crate Organization
//!
//! This is a meta-crate that re-exports types from:
//! - `filer-core`: errors, open modes, call-site tracking, and the backend trait
//! - `filer-fs`: the gate, its file handles, and the OS backend
//!
//! For fine-grained control, you can depend on individual crates instead.

// Re-export core types and traits
pub use filer_core::*;

// Re-export the gate and OS backend
pub use filer_fs::*;
