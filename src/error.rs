//! Error types for rank-window queries and tree validation.

use alloc::string::String;

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Errors reported by [`BPTreeSet`](crate::BPTreeSet).
///
/// Presence and absence of keys are never errors; those are plain `bool`/`Option` results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A rank window with `from > to`, or reaching past the last rank.
    #[error("invalid rank range {from}..={to} for a set of {len} keys")]
    InvalidRange { from: usize, to: usize, len: usize },

    /// A sorted-set score was NaN, which has no place in a total order.
    #[error("score is not a number")]
    NanScore,

    /// The validation traversal found a broken structural invariant.
    #[error("tree invariant violated: {0}")]
    Corrupted(String),
}

/// Checks a caller-supplied rank window against the current size.
pub(crate) fn check_rank_window(from: usize, to: usize, len: usize) -> Result<()> {
    if from > to || to >= len {
        return Err(Error::InvalidRange { from, to, len });
    }
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn window_inside_bounds_is_accepted() {
        assert_eq!(check_rank_window(0, 0, 1), Ok(()));
        assert_eq!(check_rank_window(3, 9, 10), Ok(()));
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert_eq!(check_rank_window(5, 4, 10), Err(Error::InvalidRange { from: 5, to: 4, len: 10 }));
    }

    #[test]
    fn window_past_end_is_rejected() {
        assert_eq!(check_rank_window(0, 10, 10), Err(Error::InvalidRange { from: 0, to: 10, len: 10 }));
        assert!(check_rank_window(0, 0, 0).is_err());
    }

    #[test]
    fn messages_name_the_window() {
        let err = Error::InvalidRange { from: 2, to: 1, len: 4 };
        assert_eq!(err.to_string(), "invalid rank range 2..=1 for a set of 4 keys");
    }
}
