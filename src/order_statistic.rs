/// A zero-based rank into the sorted order of a set.
///
/// # Examples
///
/// ```
/// use bptree::{BPTreeSet, Rank};
///
/// let set = BPTreeSet::from(["b", "a", "c"]);
/// assert_eq!(set[Rank(0)], "a");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rank(pub usize);
