//! Timeout and deadline helpers.

use std::time::Duration;

use tokio::time::Instant;

/// Represents a timeout duration for gate operations.
///
/// - `Some(duration)` - Wait up to this duration
/// - `None` - Wait indefinitely
pub type Timeout = Option<Duration>;

/// A point in time after which a wait gives up.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
    budget: Option<Duration>,
}

impl Deadline {
    pub const NEVER: Self = Self {
        at: None,
        budget: None,
    };

    /// Starts a deadline that expires `timeout` from now.
    pub fn after(timeout: Timeout) -> Self {
        match timeout {
            None => Self::NEVER,
            Some(budget) => Self {
                at: Some(Instant::now() + budget),
                budget: Some(budget),
            },
        }
    }

    /// The duration this deadline was started with (zero for infinite deadlines).
    pub fn budget(&self) -> Duration {
        self.budget.unwrap_or_default()
    }

    pub fn is_elapsed(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left before expiry; `None` for infinite deadlines.
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }
}
