//! Ordering policies that decide how keys compare inside a [`BPTreeSet`](crate::BPTreeSet).
//!
//! A policy is a zero-sized type parameter, so comparisons are resolved at compile time and
//! inline into the tree's search loops. The tree never calls [`Ord`] directly; every comparison
//! goes through [`OrderPolicy::compare`].

use alloc::boxed::Box;
use core::cmp::Ordering;
use core::fmt;

use crate::error::{Error, Result};

/// A total order over keys of type `T`.
///
/// Implementations must be consistent: `compare(a, b)` is the reverse of `compare(b, a)`, and the
/// order is transitive. Keys comparing `Equal` are treated as the same element of the set.
pub trait OrderPolicy<T: ?Sized> {
    /// Three-way comparison of `left` against `right`.
    fn compare(left: &T, right: &T) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
pub struct NaturalOrder;

impl<T: ?Sized + Ord> OrderPolicy<T> for NaturalOrder {
    #[inline]
    fn compare(left: &T, right: &T) -> Ordering {
        left.cmp(right)
    }
}

/// Sorted-set entry: a floating point score with a member name breaking ties.
///
/// # Examples
///
/// ```
/// use bptree::{BPTreeSet, ScoreOrder, ScoredMember};
///
/// let mut zset: BPTreeSet<ScoredMember, ScoreOrder> = BPTreeSet::with_policy();
/// zset.insert(ScoredMember::new(2.0, "b"));
/// zset.insert(ScoredMember::new(1.0, "z"));
/// zset.insert(ScoredMember::new(2.0, "a"));
///
/// let members: Vec<_> = zset.iter().map(|e| e.member().to_vec()).collect();
/// assert_eq!(members, [b"z".to_vec(), b"a".to_vec(), b"b".to_vec()]);
/// ```
#[derive(Clone, PartialEq)]
pub struct ScoredMember {
    score: f64,
    member: Box<[u8]>,
}

impl ScoredMember {
    /// Builds an entry, folding `-0.0` into `0.0` so both zeros are the same score.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NanScore`] if `score` is NaN.
    pub fn try_new(score: f64, member: impl AsRef<[u8]>) -> Result<Self> {
        if score.is_nan() {
            return Err(Error::NanScore);
        }
        Ok(Self {
            // -0.0 + 0.0 is +0.0; every other score is unchanged.
            score: score + 0.0,
            member: member.as_ref().into(),
        })
    }

    /// Builds an entry; see [`ScoredMember::try_new`].
    ///
    /// # Panics
    ///
    /// Panics if `score` is NaN.
    #[must_use]
    pub fn new(score: f64, member: impl AsRef<[u8]>) -> Self {
        match Self::try_new(score, member) {
            Ok(entry) => entry,
            Err(err) => panic!("{err}"),
        }
    }

    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn member(&self) -> &[u8] {
        &self.member
    }
}

// Scores are never NaN, so field-wise equality is reflexive.
impl Eq for ScoredMember {}

impl fmt::Debug for ScoredMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoredMember")
            .field("score", &self.score)
            .field("member", &core::str::from_utf8(&self.member).unwrap_or("<binary>"))
            .finish()
    }
}

/// Orders [`ScoredMember`]s by score, then bytewise by member.
///
/// Construction rules out NaN and negative zero, so [`f64::total_cmp`] on scores agrees with
/// plain `==` and `<`.
pub struct ScoreOrder;

impl OrderPolicy<ScoredMember> for ScoreOrder {
    #[inline]
    fn compare(left: &ScoredMember, right: &ScoredMember) -> Ordering {
        left.score.total_cmp(&right.score).then_with(|| left.member.cmp(&right.member))
    }
}
