use core::ops::{Index, RangeInclusive};

use super::{BPTreeSet, RankRange};
use crate::Rank;
use crate::error::{Result, check_rank_window};
use crate::policy::OrderPolicy;

impl<T, P: OrderPolicy<T>> BPTreeSet<T, P> {
    /// Returns the number of keys strictly less than `key`.
    ///
    /// `key` need not be present; for a present key this is its zero-based rank.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let set = BPTreeSet::from([10, 20, 30]);
    /// assert_eq!(set.get_rank(&20), 1);
    /// assert_eq!(set.get_rank(&25), 2);
    /// assert_eq!(set.get_rank(&99), 3);
    /// ```
    #[must_use]
    pub fn get_rank(&self, key: &T) -> usize {
        self.raw.get_rank(key)
    }

    /// Returns the number of keys less than or equal to `key`.
    ///
    /// The keys between two bounds `lo..=hi` number `upper_rank(hi) - get_rank(lo)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let set = BPTreeSet::from([10, 20, 30, 40]);
    /// assert_eq!(set.upper_rank(&30) - set.get_rank(&15), 2);
    /// ```
    #[must_use]
    pub fn upper_rank(&self, key: &T) -> usize {
        self.raw.upper_rank(key)
    }

    /// Returns the zero-based rank of `key`, or `None` if it is not present.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let set = BPTreeSet::from([10, 20]);
    /// assert_eq!(set.rank_of(&20), Some(1));
    /// assert_eq!(set.rank_of(&15), None);
    /// ```
    #[must_use]
    pub fn rank_of(&self, key: &T) -> Option<usize> {
        self.raw.rank_of(key)
    }
}

impl<T, P> BPTreeSet<T, P> {
    /// Returns the key at zero-based ascending position `rank`, or `None` if `rank >= len()`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let set = BPTreeSet::from([10, 20, 30]);
    /// assert_eq!(set.select(1), Some(&20));
    /// assert!(set.select(3).is_none());
    /// ```
    #[must_use]
    pub fn select(&self, rank: usize) -> Option<&T> {
        self.raw.select(rank)
    }

    /// Returns a lazy iterator over the keys with ranks `from..=to`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`](crate::Error::InvalidRange) if `from > to` or
    /// `to >= len()`.
    ///
    /// # Complexity
    ///
    /// O(log n) to create; each end then costs amortized O(1) per key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::{BPTreeSet, Error};
    ///
    /// let set: BPTreeSet<u32> = (0..100).map(|i| i * 2).collect();
    /// let window: Vec<_> = set.range_by_rank(10..=12)?.copied().collect();
    /// assert_eq!(window, [20, 22, 24]);
    ///
    /// assert_eq!(
    ///     set.range_by_rank(5..=100).unwrap_err(),
    ///     Error::InvalidRange { from: 5, to: 100, len: 100 }
    /// );
    /// # Ok::<(), Error>(())
    /// ```
    pub fn range_by_rank(&self, ranks: RangeInclusive<usize>) -> Result<RankRange<'_, T, P>> {
        let (from, to) = ranks.into_inner();
        check_rank_window(from, to, self.len())?;
        Ok(RankRange::new(&self.raw, from, to + 1))
    }

    /// Calls `visit` on each key with rank `from..=to`, in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `from > to` or `to >= len()`. Callers clamp ranks beforehand; use
    /// [`range_by_rank`](Self::range_by_rank) for a checked window.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let set = BPTreeSet::from([5, 1, 4, 2, 3]);
    /// let mut seen = Vec::new();
    /// set.iterate(1, 3, |&key| seen.push(key));
    /// assert_eq!(seen, [2, 3, 4]);
    /// ```
    pub fn iterate<F: FnMut(&T)>(&self, from: usize, to: usize, visit: F) {
        match self.range_by_rank(from..=to) {
            Ok(window) => window.for_each(visit),
            Err(err) => panic!("{err}"),
        }
    }

    /// Calls `visit` on each key with rank `from..=to`, in descending order: first the key at
    /// rank `to`, last the key at rank `from`.
    ///
    /// # Panics
    ///
    /// Panics if `from > to` or `to >= len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let set = BPTreeSet::from([5, 1, 4, 2, 3]);
    /// let mut seen = Vec::new();
    /// set.iterate_reverse(1, 3, |&key| seen.push(key));
    /// assert_eq!(seen, [4, 3, 2]);
    /// ```
    pub fn iterate_reverse<F: FnMut(&T)>(&self, from: usize, to: usize, visit: F) {
        match self.range_by_rank(from..=to) {
            Ok(window) => window.rev().for_each(visit),
            Err(err) => panic!("{err}"),
        }
    }
}

#[cfg(any(test, feature = "validate"))]
impl<T, P: OrderPolicy<T>> BPTreeSet<T, P> {
    /// Walks the whole tree and checks its structural invariants: key order and separator bounds,
    /// node occupancy, uniform leaf depth, cached subtree counts, and node storage accounting.
    ///
    /// Intended for test harnesses; available with the `validate` feature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupted`](crate::Error::Corrupted) describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        self.raw.validate()
    }
}

/// Indexes into the set by rank.
///
/// # Panics
///
/// Panics if `rank` is out of bounds.
///
/// # Examples
///
/// ```
/// use bptree::{BPTreeSet, Rank};
///
/// let set = BPTreeSet::from([10, 20, 30]);
/// assert_eq!(set[Rank(1)], 20);
/// ```
impl<T, P> Index<Rank> for BPTreeSet<T, P> {
    type Output = T;

    fn index(&self, rank: Rank) -> &Self::Output {
        self.select(rank.0).expect("index out of bounds")
    }
}
