//! Progress reporting for batch runs.
//!
//! The runner only talks to [`ProgressCallback`]; the binary renders it with `indicatif`
//! and library callers can pass [`NullProgress`].

pub trait ProgressCallback {
    /// Total number of parcels in the run.
    fn set_total(&self, total: u64);

    /// Parcels finished so far (absolute, never decreasing).
    fn set_position(&self, pos: u64);

    fn set_message(&self, msg: String);

    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Completed fraction in `[0, 1]`; an empty run counts as complete.
pub fn fraction(position: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        (position as f64 / total as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        assert_eq!(fraction(0, 4), 0.0);
        assert_eq!(fraction(1, 4), 0.25);
        assert_eq!(fraction(4, 4), 1.0);
        assert_eq!(fraction(0, 0), 1.0);
    }
}
