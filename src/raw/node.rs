use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use crate::policy::OrderPolicy;

// Unit tests use a small branching factor so a few hundred keys already build deep trees.
#[cfg(test)]
pub(crate) const ORDER: usize = 8;
#[cfg(not(test))]
pub(crate) const ORDER: usize = 32;

pub(crate) const MAX_ITEMS: usize = ORDER - 1;
pub(crate) const MIN_ITEMS: usize = ORDER.div_ceil(2) - 1;

// +1 leaves room for the transient overflow item before a split.
type Keys<T> = SmallVec<[T; MAX_ITEMS + 1]>;
type Children = SmallVec<[Handle; ORDER + 1]>;

#[allow(clippy::large_enum_variant)]
pub(crate) enum Node<T> {
    Internal(InternalNode<T>),
    Leaf(LeafNode<T>),
}

// B-tree: every node stores keys; internal nodes additionally own `keys.len() + 1` children.
pub(crate) struct InternalNode<T> {
    // Number of keys in the subtree rooted here, including this node's own keys.
    tree_count: usize,
    keys: Keys<T>,
    children: Children,
}

pub(crate) struct LeafNode<T> {
    keys: Keys<T>,
}

/// Result of searching for a key in a node.
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is the insertion point, and the child to descend into.
    NotFound(usize),
}

impl<T> Node<T> {
    /// Creates a leaf holding a single key.
    pub(crate) fn leaf_with(key: T) -> Self {
        let mut keys = Keys::new();
        keys.push(key);
        Node::Leaf(LeafNode { keys })
    }

    /// Returns the internal node mutably, panicking on a leaf.
    pub(crate) fn as_internal_mut(&mut self) -> &mut InternalNode<T> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    /// Returns the leaf node mutably, panicking on an internal node.
    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode<T> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    #[inline]
    pub(crate) fn keys(&self) -> &[T] {
        match self {
            Node::Internal(internal) => &internal.keys,
            Node::Leaf(leaf) => &leaf.keys,
        }
    }

    fn keys_mut(&mut self) -> &mut Keys<T> {
        match self {
            Node::Internal(internal) => &mut internal.keys,
            Node::Leaf(leaf) => &mut leaf.keys,
        }
    }

    #[inline]
    pub(crate) fn item_count(&self) -> usize {
        self.keys().len()
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &T {
        &self.keys()[index]
    }

    /// Child at `index`, or `None` for leaves.
    #[inline]
    pub(crate) fn child(&self, index: usize) -> Option<Handle> {
        match self {
            Node::Internal(internal) => Some(internal.children[index]),
            Node::Leaf(_) => None,
        }
    }

    /// Cached number of keys in this subtree.
    #[inline]
    pub(crate) fn subtree_count(&self) -> usize {
        match self {
            Node::Internal(internal) => internal.tree_count,
            Node::Leaf(leaf) => leaf.keys.len(),
        }
    }

    /// Adds `delta` to the cached count. Leaf counts are implicit, so leaves ignore this.
    pub(crate) fn add_count(&mut self, delta: usize) {
        if let Node::Internal(internal) = self {
            internal.tree_count += delta;
        }
    }

    /// Subtracts `delta` from the cached count. Leaves ignore this.
    pub(crate) fn sub_count(&mut self, delta: usize) {
        if let Node::Internal(internal) = self {
            internal.tree_count -= delta;
        }
    }

    /// True once an insertion pushed the node past capacity.
    pub(crate) fn is_overfull(&self) -> bool {
        self.item_count() > MAX_ITEMS
    }

    /// True when a non-root node fell below minimum occupancy.
    pub(crate) fn is_underfull(&self) -> bool {
        self.item_count() < MIN_ITEMS
    }

    /// True if the node can give away one key and still meet minimum occupancy.
    pub(crate) fn can_lend(&self) -> bool {
        self.item_count() > MIN_ITEMS
    }

    #[inline]
    pub(crate) fn search<P: OrderPolicy<T>>(&self, key: &T) -> SearchResult {
        match self.keys().binary_search_by(|probe| P::compare(probe, key)) {
            Ok(idx) => SearchResult::Found(idx),
            Err(idx) => SearchResult::NotFound(idx),
        }
    }

    /// Overwrites the key at `index`, returning the previous one.
    pub(crate) fn replace_key(&mut self, index: usize, key: T) -> T {
        core::mem::replace(&mut self.keys_mut()[index], key)
    }

    /// Removes the last key, and the last child for internal nodes.
    pub(crate) fn pop_last(&mut self) -> (T, Option<Handle>) {
        let key = self.keys_mut().pop().expect("`Node::pop_last()` - node has no keys!");
        let child = match self {
            Node::Internal(internal) => internal.children.pop(),
            Node::Leaf(_) => None,
        };
        (key, child)
    }

    /// Removes the first key, and the first child for internal nodes.
    pub(crate) fn pop_first(&mut self) -> (T, Option<Handle>) {
        let key = self.keys_mut().remove(0);
        let child = match self {
            Node::Internal(internal) => Some(internal.children.remove(0)),
            Node::Leaf(_) => None,
        };
        (key, child)
    }

    /// Prepends a key, and a leading child for internal nodes.
    pub(crate) fn push_first(&mut self, key: T, child: Option<Handle>) {
        self.keys_mut().insert(0, key);
        if let (Node::Internal(internal), Some(child)) = (self, child) {
            internal.children.insert(0, child);
        }
    }

    /// Appends a key, and a trailing child for internal nodes.
    pub(crate) fn push_last(&mut self, key: T, child: Option<Handle>) {
        self.keys_mut().push(key);
        if let (Node::Internal(internal), Some(child)) = (self, child) {
            internal.children.push(child);
        }
    }

    /// Splits an overfull node around its median key. Returns (`median`, `right`).
    pub(crate) fn split(&mut self) -> (T, Node<T>) {
        match self {
            Node::Leaf(leaf) => {
                let (median, right) = leaf.split();
                (median, Node::Leaf(right))
            }
            Node::Internal(internal) => {
                let (median, right) = internal.split();
                (median, Node::Internal(right))
            }
        }
    }

    /// Absorbs the right sibling and the separator that sat between them.
    ///
    /// The caller adjusts the cached count; see [`Node::add_count`].
    pub(crate) fn merge_with_right(&mut self, separator: T, right: Node<T>) {
        match (self, right) {
            (Node::Leaf(left), Node::Leaf(mut right)) => {
                left.keys.push(separator);
                left.keys.append(&mut right.keys);
            }
            (Node::Internal(left), Node::Internal(mut right)) => {
                left.keys.push(separator);
                left.keys.append(&mut right.keys);
                left.children.append(&mut right.children);
            }
            _ => panic!("`Node::merge_with_right()` - siblings at different depths!"),
        }
    }
}

impl<T> InternalNode<T> {
    /// Creates a root over two children separated by `separator`.
    pub(crate) fn new_root(left: Handle, separator: T, right: Handle, tree_count: usize) -> Self {
        let mut keys = Keys::new();
        keys.push(separator);
        let mut children = Children::new();
        children.push(left);
        children.push(right);
        Self {
            tree_count,
            keys,
            children,
        }
    }

    #[cfg(any(test, feature = "validate"))]
    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    #[cfg(any(test, feature = "validate"))]
    pub(crate) fn tree_count(&self) -> usize {
        self.tree_count
    }

    pub(crate) fn set_tree_count(&mut self, tree_count: usize) {
        self.tree_count = tree_count;
    }

    /// Recomputes the cached count from the children's cached counts.
    pub(crate) fn recount(&mut self, nodes: &Arena<Node<T>>) {
        self.tree_count =
            self.keys.len() + self.children.iter().map(|&child| nodes.get(child).subtree_count()).sum::<usize>();
    }

    /// Inserts `key` at `index` with `right` as the child following it.
    pub(crate) fn insert_child(&mut self, index: usize, key: T, right: Handle) {
        self.keys.insert(index, key);
        self.children.insert(index + 1, right);
    }

    /// Removes key `index` together with the child to its right.
    pub(crate) fn remove_child(&mut self, index: usize) -> (T, Handle) {
        let key = self.keys.remove(index);
        let child = self.children.remove(index + 1);
        (key, child)
    }

    /// Splits around the median key. Returns (`median`, `right`).
    ///
    /// Neither half has a valid `tree_count` afterwards; the caller recomputes both from the
    /// children, since only it can see them.
    pub(crate) fn split(&mut self) -> (T, InternalNode<T>) {
        let mid = self.keys.len() / 2;
        let right = InternalNode {
            tree_count: 0,
            keys: self.keys.drain(mid + 1..).collect(),
            children: self.children.drain(mid + 1..).collect(),
        };
        let median = self.keys.pop().expect("`InternalNode::split()` - node has no median!");
        (median, right)
    }
}

impl<T> LeafNode<T> {
    pub(crate) fn insert(&mut self, index: usize, key: T) {
        self.keys.insert(index, key);
    }

    pub(crate) fn remove(&mut self, index: usize) -> T {
        self.keys.remove(index)
    }

    /// Splits around the median key. Returns (`median`, `right`).
    pub(crate) fn split(&mut self) -> (T, LeafNode<T>) {
        let mid = self.keys.len() / 2;
        let right = LeafNode {
            keys: self.keys.drain(mid + 1..).collect(),
        };
        let median = self.keys.pop().expect("`LeafNode::split()` - node has no median!");
        (median, right)
    }
}

impl<T: Clone> Node<T> {
    /// Deep-copies the subtree at `handle` from `source` into `target`.
    pub(crate) fn clone_subtree(source: &Arena<Node<T>>, target: &mut Arena<Node<T>>, handle: Handle) -> Handle {
        match source.get(handle) {
            Node::Leaf(leaf) => target.alloc(Node::Leaf(LeafNode {
                keys: leaf.keys.clone(),
            })),
            Node::Internal(internal) => {
                let children = internal
                    .children
                    .iter()
                    .map(|&child| Self::clone_subtree(source, target, child))
                    .collect();
                target.alloc(Node::Internal(InternalNode {
                    tree_count: internal.tree_count,
                    keys: internal.keys.clone(),
                    children,
                }))
            }
        }
    }
}

#[cfg(any(test, feature = "validate"))]
impl<T> Node<T> {
    /// Recounts the keys under this node without trusting any cached count.
    pub(crate) fn debug_tree_count(&self, nodes: &Arena<Node<T>>) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.keys.len(),
            Node::Internal(internal) => {
                internal.keys.len()
                    + internal.children.iter().map(|&child| nodes.get(child).debug_tree_count(nodes)).sum::<usize>()
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::policy::NaturalOrder;
    use alloc::vec::Vec;

    fn leaf(keys: &[u32]) -> Node<u32> {
        Node::Leaf(LeafNode {
            keys: keys.iter().copied().collect(),
        })
    }

    #[test]
    fn occupancy_bounds_follow_order() {
        assert_eq!(MAX_ITEMS, ORDER - 1);
        assert_eq!(MIN_ITEMS, ORDER.div_ceil(2) - 1);
        // A minimal node plus an underfull sibling plus the separator fits in one node.
        assert!(MIN_ITEMS + (MIN_ITEMS - 1) + 1 <= MAX_ITEMS);
        // Both halves of an overfull node meet minimum occupancy.
        assert!(MAX_ITEMS / 2 >= MIN_ITEMS);
    }

    #[test]
    fn search_reports_insertion_point() {
        let node = leaf(&[10, 20, 30]);
        assert!(matches!(node.search::<NaturalOrder>(&20), SearchResult::Found(1)));
        assert!(matches!(node.search::<NaturalOrder>(&5), SearchResult::NotFound(0)));
        assert!(matches!(node.search::<NaturalOrder>(&25), SearchResult::NotFound(2)));
        assert!(matches!(node.search::<NaturalOrder>(&99), SearchResult::NotFound(3)));
    }

    #[test]
    fn leaf_split_promotes_median() {
        let keys: Vec<u32> = (0..=MAX_ITEMS as u32).collect();
        let Node::Leaf(mut left) = leaf(&keys) else { unreachable!() };
        let (median, right) = left.split();

        assert_eq!(median, (ORDER / 2) as u32);
        assert_eq!(left.keys.len() + 1 + right.keys.len(), ORDER);
        assert!(left.keys.len() >= MIN_ITEMS);
        assert!(right.keys.len() >= MIN_ITEMS);
        assert!(left.keys.iter().all(|&k| k < median));
        assert!(right.keys.iter().all(|&k| k > median));
    }

    #[test]
    fn internal_split_partitions_children() {
        let mut nodes = Arena::new();
        let children: Children = (0..=ORDER).map(|i| nodes.alloc(leaf(&[i as u32]))).collect();
        let mut internal = InternalNode {
            tree_count: 0,
            keys: (0..ORDER as u32).collect(),
            children,
        };
        let (median, right) = internal.split();

        assert_eq!(median, (ORDER / 2) as u32);
        assert_eq!(internal.child_count(), internal.keys.len() + 1);
        assert_eq!(right.child_count(), right.keys.len() + 1);
        assert_eq!(internal.child_count() + right.child_count(), ORDER + 1);
    }

    #[test]
    fn rotation_moves_key_and_child() {
        let mut nodes = Arena::new();
        let a = nodes.alloc(leaf(&[1]));
        let b = nodes.alloc(leaf(&[3]));
        let c = nodes.alloc(leaf(&[5]));
        let mut left = Node::Internal(InternalNode::new_root(a, 2, b, 3));
        let mut right = Node::Internal(InternalNode::new_root(c, 6, nodes.alloc(leaf(&[7])), 3));

        let (key, child) = left.pop_last();
        assert_eq!((key, child), (2, Some(b)));
        right.push_first(4, child);
        assert_eq!(right.keys(), &[4, 6]);
        assert_eq!(right.child(0), Some(b));
        assert!(matches!(&left, Node::Internal(internal) if internal.child_count() == 1));
    }

    #[test]
    fn merge_concatenates_around_separator() {
        let mut left = leaf(&[1, 2]);
        left.merge_with_right(3, leaf(&[4, 5]));
        assert_eq!(left.keys(), &[1, 2, 3, 4, 5]);
        assert_eq!(left.subtree_count(), 5);
    }

    #[test]
    #[should_panic(expected = "siblings at different depths")]
    fn merge_rejects_mixed_levels() {
        let mut nodes = Arena::new();
        let a = nodes.alloc(leaf(&[1]));
        let b = nodes.alloc(leaf(&[3]));
        let mut left = leaf(&[0]);
        left.merge_with_right(1, Node::Internal(InternalNode::new_root(a, 2, b, 3)));
    }

    #[test]
    fn debug_count_recomputes_subtree() {
        let mut nodes = Arena::new();
        let a = nodes.alloc(leaf(&[1, 2]));
        let b = nodes.alloc(leaf(&[4, 5, 6]));
        let root = Node::Internal(InternalNode::new_root(a, 3, b, 0));
        assert_eq!(root.subtree_count(), 0);
        assert_eq!(root.debug_tree_count(&nodes), 6);
    }
}
