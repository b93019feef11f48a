use super::BPTreeSet;
use crate::raw::RawBPTree;

impl<T> BPTreeSet<T> {
    /// Creates an empty set with node storage reserved for at least `capacity` keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let set: BPTreeSet<i32> = BPTreeSet::with_capacity(1000);
    /// assert!(set.is_empty());
    /// assert!(set.capacity() >= 1000);
    /// assert_eq!(set.used_bytes(), 0);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        BPTreeSet {
            raw: RawBPTree::with_capacity(capacity),
        }
    }
}

impl<T, P> BPTreeSet<T, P> {
    /// Returns how many keys the reserved node storage holds when every node is full.
    ///
    /// Nodes are usually not full, so the set may grow its storage before `len()` reaches this.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.raw.node_count()
    }

    /// Returns the bytes held by live nodes.
    ///
    /// Every node is charged the same fixed block size, so this is `node_count()` times the block
    /// size. It drops back to exactly zero once the set is emptied.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPTreeSet;
    ///
    /// let mut set = BPTreeSet::new();
    /// assert_eq!(set.used_bytes(), 0);
    /// set.insert("x");
    /// assert!(set.used_bytes() > 0);
    /// set.remove(&"x");
    /// assert_eq!(set.used_bytes(), 0);
    /// ```
    #[must_use]
    pub const fn used_bytes(&self) -> usize {
        self.raw.used_bytes()
    }
}
