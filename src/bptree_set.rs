use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;

use crate::policy::{NaturalOrder, OrderPolicy};
use crate::raw::{Cursor, RawBPTree};

mod capacity;
mod order_statistic;

/// An ordered set of unique keys, stored in a B-tree that caches the key count of every subtree.
///
/// Besides membership, the cached counts answer order-statistic queries in O(log n): the rank of
/// any key (present or not), the key at a given rank, and lazy iteration over a window of ranks in
/// either direction.
///
/// Ordering comes from the policy parameter `P`, resolved at compile time. The default,
/// [`NaturalOrder`], uses `T: Ord`; sorted-set style `(score, member)` keys use
/// [`ScoreOrder`](crate::ScoreOrder).
///
/// It is a logic error for a key to be modified in such a way that its ordering relative to any
/// other key, as determined by `P`, changes while it is in the set. The behavior resulting from
/// such a logic error is not specified, but will be encapsulated to the `BPTreeSet` that observed
/// the logic error and not result in undefined behavior.
///
/// # Examples
///
/// ```
/// use bptree::BPTreeSet;
///
/// let mut set = BPTreeSet::new();
/// for key in [50, 10, 40, 20, 30] {
///     assert!(set.insert(key));
/// }
/// assert!(!set.insert(30));
///
/// assert_eq!(set.get_rank(&35), 3);
/// assert_eq!(set.select(0), Some(&10));
///
/// let window: Vec<_> = set.range_by_rank(1..=3).unwrap().copied().collect();
/// assert_eq!(window, [20, 30, 40]);
/// ```
pub struct BPTreeSet<T, P = NaturalOrder> {
    raw: RawBPTree<T, P>,
}

/// A lazy iterator over a window of ranks in a `BPTreeSet`.
///
/// This `struct` is created by the [`range_by_rank`] method on [`BPTreeSet`]. Each end seeks its
/// starting key on first use and then steps to in-order neighbours, so a window of `k` keys costs
/// O(log n + k).
///
/// # Examples
///
/// ```
/// use bptree::BPTreeSet;
///
/// let set = BPTreeSet::from([1, 2, 3, 4, 5]);
/// let mut window = set.range_by_rank(1..=3).unwrap();
/// assert_eq!(window.len(), 3);
/// assert_eq!(window.next(), Some(&2));
/// assert_eq!(window.next_back(), Some(&4));
/// assert_eq!(window.next(), Some(&3));
/// assert_eq!(window.next(), None);
/// ```
///
/// [`range_by_rank`]: BPTreeSet::range_by_rank
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct RankRange<'a, T, P = NaturalOrder> {
    tree: &'a RawBPTree<T, P>,
    front: Option<Cursor>,
    back: Option<Cursor>,
    // Rank of the next key `next` yields.
    front_rank: usize,
    // One past the rank of the next key `next_back` yields.
    back_rank: usize,
}

/// An iterator over the keys of a `BPTreeSet`, in ascending order.
///
/// This `struct` is created by the [`iter`] method on [`BPTreeSet`].
///
/// # Examples
///
/// ```
/// use bptree::BPTreeSet;
///
/// let set = BPTreeSet::from([3, 1, 2]);
/// let mut iter = set.iter();
/// assert_eq!(iter.next(), Some(&1));
/// assert_eq!(iter.next_back(), Some(&3));
/// assert_eq!(iter.next(), Some(&2));
/// ```
///
/// [`iter`]: BPTreeSet::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, T, P = NaturalOrder> {
    inner: RankRange<'a, T, P>,
}

/// An owning iterator over the keys of a `BPTreeSet`, in ascending order.
///
/// This `struct` is created by the `into_iter` method on [`BPTreeSet`] (provided by the
/// [`IntoIterator`] trait).
pub struct IntoIter<T, P = NaturalOrder> {
    set: BPTreeSet<T, P>,
}

impl<T> BPTreeSet<T> {
    /// Makes a new, empty `BPTreeSet` ordered by `T: Ord`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let mut set: BPTreeSet<i32> = BPTreeSet::new();
    /// assert_eq!(set.height(), 0);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self::with_policy()
    }
}

impl<T, P> BPTreeSet<T, P> {
    /// Makes a new, empty `BPTreeSet` ordered by the policy `P`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::{BPTreeSet, ScoreOrder, ScoredMember};
    ///
    /// let mut board: BPTreeSet<ScoredMember, ScoreOrder> = BPTreeSet::with_policy();
    /// board.insert(ScoredMember::new(2.5, "b"));
    /// board.insert(ScoredMember::new(1.0, "a"));
    /// assert_eq!(board.first().map(ScoredMember::member), Some(&b"a"[..]));
    /// ```
    #[must_use]
    pub const fn with_policy() -> Self {
        BPTreeSet { raw: RawBPTree::new() }
    }

    /// Returns the number of keys in the set.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the set contains no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Returns the number of node levels: 0 for an empty set, 1 while the root is a leaf.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let mut set = BPTreeSet::new();
    /// set.insert(1);
    /// assert_eq!(set.height(), 1);
    /// set.remove(&1);
    /// assert_eq!(set.height(), 0);
    /// ```
    #[must_use]
    pub const fn height(&self) -> usize {
        self.raw.height()
    }

    /// Removes every key, releasing all node storage.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let mut set: BPTreeSet<u32> = (0..1000).collect();
    /// set.clear();
    /// assert!(set.is_empty());
    /// assert_eq!(set.used_bytes(), 0);
    /// ```
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the smallest key, if any.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.raw.first()
    }

    /// Returns the largest key, if any.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.raw.last()
    }

    /// Removes and returns the smallest key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let mut set = BPTreeSet::from([3, 1, 2]);
    /// assert_eq!(set.pop_first(), Some(1));
    /// assert_eq!(set.len(), 2);
    /// ```
    pub fn pop_first(&mut self) -> Option<T> {
        self.raw.pop_first()
    }

    /// Removes and returns the largest key.
    pub fn pop_last(&mut self) -> Option<T> {
        self.raw.pop_last()
    }

    /// Gets an iterator that visits the keys in ascending order.
    pub fn iter(&self) -> Iter<'_, T, P> {
        Iter {
            inner: RankRange::new(&self.raw, 0, self.raw.len()),
        }
    }
}

impl<T, P: OrderPolicy<T>> BPTreeSet<T, P> {
    /// Adds a key to the set.
    ///
    /// Returns whether the key was newly inserted. An equal key already present is left in place.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, key: T) -> bool {
        self.raw.insert(key)
    }

    /// Removes a key from the set. Returns whether the key was present.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let mut set = BPTreeSet::from([1, 2]);
    /// assert!(set.remove(&2));
    /// assert!(!set.remove(&2));
    /// ```
    pub fn remove(&mut self, key: &T) -> bool {
        self.raw.take(key).is_some()
    }

    /// Removes and returns the stored key equal to `key`, if any.
    pub fn take(&mut self, key: &T) -> Option<T> {
        self.raw.take(key)
    }

    /// Returns `true` if the set contains a key equal to `key`.
    #[must_use]
    pub fn contains(&self, key: &T) -> bool {
        self.raw.contains(key)
    }
}

impl<T, P> Default for BPTreeSet<T, P> {
    fn default() -> Self {
        Self::with_policy()
    }
}

impl<T: Clone, P> Clone for BPTreeSet<T, P> {
    fn clone(&self) -> Self {
        BPTreeSet { raw: self.raw.clone() }
    }
}

impl<T: fmt::Debug, P> fmt::Debug for BPTreeSet<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

// Keys are matched by the set's own ordering, so two sets are equal exactly when each contains
// the other's keys.
impl<T, P: OrderPolicy<T>> PartialEq for BPTreeSet<T, P> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| P::compare(a, b) == Ordering::Equal)
    }
}

impl<T, P: OrderPolicy<T>> Eq for BPTreeSet<T, P> {}

impl<T, P: OrderPolicy<T>> FromIterator<T> for BPTreeSet<T, P> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = BPTreeSet::with_policy();
        set.extend(iter);
        set
    }
}

impl<T, P: OrderPolicy<T>> Extend<T> for BPTreeSet<T, P> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a, T: 'a + Copy, P: OrderPolicy<T>> Extend<&'a T> for BPTreeSet<T, P> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for &key in iter {
            self.insert(key);
        }
    }
}

impl<T: Ord, const N: usize> From<[T; N]> for BPTreeSet<T> {
    fn from(keys: [T; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<T, P> IntoIterator for BPTreeSet<T, P> {
    type Item = T;
    type IntoIter = IntoIter<T, P>;

    /// Gets an iterator for moving out the set's keys in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let set = BPTreeSet::from([4, 2, 3, 1]);
    /// let keys: Vec<_> = set.into_iter().collect();
    /// assert_eq!(keys, [1, 2, 3, 4]);
    /// ```
    fn into_iter(self) -> IntoIter<T, P> {
        IntoIter { set: self }
    }
}

impl<'a, T, P> IntoIterator for &'a BPTreeSet<T, P> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, P>;

    fn into_iter(self) -> Iter<'a, T, P> {
        self.iter()
    }
}

impl<'a, T, P> RankRange<'a, T, P> {
    /// Window over ranks `start..end`; the caller checks `end <= tree.len()`.
    fn new(tree: &'a RawBPTree<T, P>, start: usize, end: usize) -> Self {
        debug_assert!(start <= end && end <= tree.len(), "`RankRange::new()` - window out of bounds!");
        RankRange {
            tree,
            front: None,
            back: None,
            front_rank: start,
            back_rank: end,
        }
    }
}

impl<'a, T, P> Iterator for RankRange<'a, T, P> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.front_rank == self.back_rank {
            return None;
        }
        let tree = self.tree;
        match &mut self.front {
            Some(cursor) => {
                cursor.advance(tree.nodes());
            }
            None => self.front = tree.cursor_at(self.front_rank),
        }
        self.front_rank += 1;
        self.front.as_ref().map(|cursor| cursor.key(tree.nodes()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back_rank - self.front_rank;
        (len, Some(len))
    }

    fn last(mut self) -> Option<&'a T> {
        self.next_back()
    }
}

impl<'a, T, P> DoubleEndedIterator for RankRange<'a, T, P> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front_rank == self.back_rank {
            return None;
        }
        let tree = self.tree;
        self.back_rank -= 1;
        match &mut self.back {
            Some(cursor) => {
                cursor.retreat(tree.nodes());
            }
            None => self.back = tree.cursor_at(self.back_rank),
        }
        self.back.as_ref().map(|cursor| cursor.key(tree.nodes()))
    }
}

impl<T, P> ExactSizeIterator for RankRange<'_, T, P> {
    fn len(&self) -> usize {
        self.back_rank - self.front_rank
    }
}

impl<T, P> FusedIterator for RankRange<'_, T, P> {}

impl<T, P> Clone for RankRange<'_, T, P> {
    fn clone(&self) -> Self {
        RankRange {
            tree: self.tree,
            front: self.front.clone(),
            back: self.back.clone(),
            front_rank: self.front_rank,
            back_rank: self.back_rank,
        }
    }
}

impl<T: fmt::Debug, P> fmt::Debug for RankRange<'_, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, T, P> Iterator for Iter<'a, T, P> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }

    fn last(mut self) -> Option<&'a T> {
        self.next_back()
    }
}

impl<'a, T, P> DoubleEndedIterator for Iter<'a, T, P> {
    fn next_back(&mut self) -> Option<&'a T> {
        self.inner.next_back()
    }
}

impl<T, P> ExactSizeIterator for Iter<'_, T, P> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<T, P> FusedIterator for Iter<'_, T, P> {}

impl<T, P> Clone for Iter<'_, T, P> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug, P> fmt::Debug for Iter<'_, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iter").field(&self.inner).finish()
    }
}

impl<T, P> Iterator for IntoIter<T, P> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.set.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.set.len(), Some(self.set.len()))
    }
}

impl<T, P> DoubleEndedIterator for IntoIter<T, P> {
    fn next_back(&mut self) -> Option<T> {
        self.set.pop_last()
    }
}

impl<T, P> ExactSizeIterator for IntoIter<T, P> {
    fn len(&self) -> usize {
        self.set.len()
    }
}

impl<T, P> FusedIterator for IntoIter<T, P> {}

impl<T: fmt::Debug, P> fmt::Debug for IntoIter<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.set).finish()
    }
}
