//! Admission limit derived from the process open-file ceiling.

/// Limit used when the open-file ceiling cannot be read.
pub const FALLBACK_LIMIT: usize = 90;

/// Picks the admission limit for a gate.
///
/// A non-zero `requested` limit is used as-is. Otherwise the limit is the
/// open-file `ceiling` minus a 10% margin, or [`FALLBACK_LIMIT`] if there is
/// no usable ceiling.
pub fn admission_limit(requested: usize, ceiling: Option<u64>) -> usize {
    if requested > 0 {
        return requested;
    }
    match ceiling {
        Some(max) if max - max / 10 > 0 => usize::try_from(max - max / 10).unwrap_or(usize::MAX),
        _ => FALLBACK_LIMIT,
    }
}

/// Reads the process `RLIMIT_NOFILE` ceiling.
///
/// Prefers the hard limit; falls back to the soft limit when the hard one is
/// unlimited, and returns `None` when both are.
#[cfg(unix)]
pub fn open_file_ceiling() -> Option<u64> {
    use libc::{RLIM_INFINITY, RLIMIT_NOFILE, getrlimit, rlimit};

    let mut limits = rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: getrlimit is called with a valid pointer to an initialized rlimit.
    if unsafe { getrlimit(RLIMIT_NOFILE, &mut limits) } != 0 {
        return None;
    }
    [limits.rlim_max, limits.rlim_cur]
        .into_iter()
        .find(|&lim| lim != RLIM_INFINITY && lim > 0)
        .map(|lim| lim as u64)
}

#[cfg(not(unix))]
pub fn open_file_ceiling() -> Option<u64> {
    None
}
