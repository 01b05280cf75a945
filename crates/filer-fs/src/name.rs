//! Temporary file name generation.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Park-Miller modulus, 2^31 - 1.
const MODULUS: u64 = 0x7fff_ffff;

/// Park-Miller multiplier (the `minstd_rand` variant).
const MULTIPLIER: u64 = 48271;

/// Park-Miller generator producing the random token in temporary file names.
///
/// The state is never zero once seeded. The gate keeps one of these behind
/// its admission mutex, so concurrent callers always draw distinct values.
#[derive(Debug, Default)]
pub(crate) struct TempNames {
    state: u32,
}

impl TempNames {
    /// A generator with a fixed seed; seeds of zero are replaced on first use.
    #[cfg(test)]
    pub(crate) fn with_seed(seed: u32) -> Self {
        Self {
            state: (u64::from(seed) % MODULUS) as u32,
        }
    }

    /// Advances the generator, seeding it from the clock and process id first
    /// if it has not been seeded yet.
    pub(crate) fn next_value(&mut self) -> u32 {
        if self.state == 0 {
            self.state = clock_seed();
        }
        self.state = (u64::from(self.state) * MULTIPLIER % MODULUS) as u32;
        self.state
    }

    /// The next value as a lowercase hex token.
    pub(crate) fn next_token(&mut self) -> String {
        format!("{:x}", self.next_value())
    }
}

fn clock_seed() -> u32 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seed = (nanos + u128::from(std::process::id())) % u128::from(MODULUS);
    (seed as u32).max(1)
}

/// Joins `dir` with `prefix`, `token`, and `suffix`.
pub(crate) fn temp_file_path(dir: &Path, prefix: &str, token: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{prefix}{token}{suffix}"))
}
