use core::marker::PhantomData;

use super::arena::Arena;
use super::cursor::{Cursor, Path, PathElement, descend_rightmost};
use super::handle::Handle;
use super::node::{InternalNode, MAX_ITEMS, Node, SearchResult};
use crate::policy::OrderPolicy;

/// The core B-tree backing `BPTreeSet`.
///
/// Nodes live in an arena and own their children through handles; there are no parent pointers.
/// Every mutation descends once from the root and records a [`Path`], which is then walked back
/// up to adjust cached subtree counts and repair overflow or underflow.
pub(crate) struct RawBPTree<T, P> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<T>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
    /// Total number of keys in the tree.
    len: usize,
    /// Number of node levels; 1 for a lone leaf root, 0 when empty.
    height: usize,
    policy: PhantomData<fn() -> P>,
}

impl<T, P> RawBPTree<T, P> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            len: 0,
            height: 0,
            policy: PhantomData,
        }
    }

    /// Creates a tree whose arena can hold `capacity` keys in full nodes without reallocating.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity.div_ceil(MAX_ITEMS)),
            ..Self::new()
        }
    }

    /// Keys that fit in the reserved node slots if every node were full.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity() * MAX_ITEMS
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn height(&self) -> usize {
        self.height
    }

    pub(crate) const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn used_bytes(&self) -> usize {
        self.nodes.used()
    }

    pub(crate) fn nodes(&self) -> &Arena<Node<T>> {
        &self.nodes
    }

    /// Frees every node and resets the tree to empty.
    pub(crate) fn clear(&mut self) {
        let released_nodes = self.nodes.len();
        let released_bytes = self.nodes.used();
        self.nodes.clear();
        self.root = None;
        self.len = 0;
        self.height = 0;
        tracing::debug!(released_nodes, released_bytes, "cleared tree");
    }

    /// Positions a cursor on the key at ascending position `rank`.
    pub(crate) fn cursor_at(&self, rank: usize) -> Option<Cursor> {
        if rank >= self.len {
            return None;
        }
        Some(Cursor::seek_rank(&self.nodes, self.root?, rank))
    }

    /// Returns the key at ascending position `rank`.
    pub(crate) fn select(&self, rank: usize) -> Option<&T> {
        self.cursor_at(rank).map(|cursor| cursor.key(&self.nodes))
    }

    pub(crate) fn first(&self) -> Option<&T> {
        let root = self.root?;
        Some(Cursor::first(&self.nodes, root).key(&self.nodes))
    }

    pub(crate) fn last(&self) -> Option<&T> {
        let root = self.root?;
        Some(Cursor::last(&self.nodes, root).key(&self.nodes))
    }

    /// Removes and returns the smallest key.
    pub(crate) fn pop_first(&mut self) -> Option<T> {
        let root = self.root?;
        let path = Cursor::first(&self.nodes, root).into_path();
        Some(self.remove_at(path))
    }

    /// Removes and returns the largest key.
    pub(crate) fn pop_last(&mut self) -> Option<T> {
        let root = self.root?;
        let path = Cursor::last(&self.nodes, root).into_path();
        Some(self.remove_at(path))
    }

    /// Removes the key the last path element points at and restores every invariant.
    fn remove_at(&mut self, mut path: Path) -> T {
        let target = *path.last().expect("`RawBPTree::remove_at()` - empty path!");

        // Removal always happens in a leaf: an internal key trades places with its predecessor.
        let removed = if let Some(left) = self.nodes.get(target.node).child(target.index) {
            descend_rightmost(&self.nodes, &mut path, left);
            let leaf = *path.last().expect("`RawBPTree::remove_at()` - empty path!");
            let predecessor = self.nodes.get_mut(leaf.node).as_leaf_mut().remove(leaf.index);
            self.nodes.get_mut(target.node).replace_key(target.index, predecessor)
        } else {
            self.nodes.get_mut(target.node).as_leaf_mut().remove(target.index)
        };
        self.len -= 1;

        if self.len == 0 {
            if let Some(root) = self.root.take() {
                self.nodes.free(root);
            }
            self.height = 0;
            return removed;
        }

        let ancestors = path.len() - 1;
        for elem in &path[..ancestors] {
            self.nodes.get_mut(elem.node).sub_count(1);
        }

        self.rebalance(&path);
        removed
    }

    /// Repairs underflow bottom-up along `path`, then collapses an emptied root.
    fn rebalance(&mut self, path: &Path) {
        for level in (1..path.len()).rev() {
            let node = path[level].node;
            if !self.nodes.get(node).is_underfull() {
                return;
            }

            let parent = path[level - 1];
            let slot = parent.index;
            let parent_node = self.nodes.get(parent.node);
            let left = if slot > 0 { parent_node.child(slot - 1) } else { None };
            let right = if slot < parent_node.item_count() {
                parent_node.child(slot + 1)
            } else {
                None
            };

            if let Some(left) = left
                && self.nodes.get(left).can_lend()
            {
                self.rotate_from_left(parent.node, slot - 1, left, node);
                return;
            }
            if let Some(right) = right
                && self.nodes.get(right).can_lend()
            {
                self.rotate_from_right(parent.node, slot, node, right);
                return;
            }

            match (left, right) {
                (Some(left), _) => self.merge(parent.node, slot - 1, left, node),
                (None, Some(right)) => self.merge(parent.node, slot, node, right),
                (None, None) => unreachable!("`RawBPTree::rebalance()` - non-root node without siblings"),
            }
        }

        let root = path[0].node;
        let root_node = self.nodes.get(root);
        if root_node.item_count() == 0
            && let Some(only_child) = root_node.child(0)
        {
            self.nodes.free(root);
            self.root = Some(only_child);
            self.height -= 1;
            tracing::trace!(height = self.height, "root collapsed");
        }
    }

    /// Moves the left sibling's last key up into the parent and the old separator down into
    /// `node`; an internal sibling also hands over its last child.
    fn rotate_from_left(&mut self, parent: Handle, separator: usize, left: Handle, node: Handle) {
        let (key, child) = self.nodes.get_mut(left).pop_last();
        let old_separator = self.nodes.get_mut(parent).replace_key(separator, key);
        self.nodes.get_mut(node).push_first(old_separator, child);

        let moved = 1 + child.map_or(0, |child| self.nodes.get(child).subtree_count());
        self.nodes.get_mut(left).sub_count(moved);
        self.nodes.get_mut(node).add_count(moved);
    }

    /// Mirror of [`Self::rotate_from_left`].
    fn rotate_from_right(&mut self, parent: Handle, separator: usize, node: Handle, right: Handle) {
        let (key, child) = self.nodes.get_mut(right).pop_first();
        let old_separator = self.nodes.get_mut(parent).replace_key(separator, key);
        self.nodes.get_mut(node).push_last(old_separator, child);

        let moved = 1 + child.map_or(0, |child| self.nodes.get(child).subtree_count());
        self.nodes.get_mut(right).sub_count(moved);
        self.nodes.get_mut(node).add_count(moved);
    }

    /// Folds `right` and the separator between the siblings into `left`, freeing `right`.
    /// The parent loses one key; its cached count does not change.
    fn merge(&mut self, parent: Handle, separator: usize, left: Handle, right: Handle) {
        let (separator, removed) = self.nodes.get_mut(parent).as_internal_mut().remove_child(separator);
        debug_assert_eq!(removed, right, "`RawBPTree::merge()` - separator does not precede `right`");

        let right_node = self.nodes.take(right);
        let absorbed = 1 + right_node.subtree_count();
        let left_node = self.nodes.get_mut(left);
        left_node.merge_with_right(separator, right_node);
        left_node.add_count(absorbed);
    }
}

impl<T, P: OrderPolicy<T>> RawBPTree<T, P> {
    /// Descends towards `key`, recording the path. Returns `true` if the key was found, in which
    /// case the last element points at it; otherwise the last element is the leaf insertion point.
    fn locate(&self, root: Handle, key: &T, path: &mut Path) -> bool {
        let mut current = root;
        loop {
            let node = self.nodes.get(current);
            match node.search::<P>(key) {
                SearchResult::Found(index) => {
                    path.push(PathElement { node: current, index });
                    return true;
                }
                SearchResult::NotFound(index) => {
                    path.push(PathElement { node: current, index });
                    match node.child(index) {
                        Some(child) => current = child,
                        None => return false,
                    }
                }
            }
        }
    }

    pub(crate) fn contains(&self, key: &T) -> bool {
        let Some(mut current) = self.root else {
            return false;
        };
        loop {
            let node = self.nodes.get(current);
            match node.search::<P>(key) {
                SearchResult::Found(_) => return true,
                SearchResult::NotFound(index) => match node.child(index) {
                    Some(child) => current = child,
                    None => return false,
                },
            }
        }
    }

    /// Counts the keys strictly less than `key` and reports whether `key` itself is stored.
    fn rank_search(&self, key: &T) -> (usize, bool) {
        let Some(mut current) = self.root else {
            return (0, false);
        };
        let mut rank = 0;

        loop {
            let node = self.nodes.get(current);
            let (index, found) = match node.search::<P>(key) {
                SearchResult::Found(index) => (index, true),
                SearchResult::NotFound(index) => (index, false),
            };

            // Keys left of `index`, plus every subtree entirely left of the descent.
            rank += index;
            if let Node::Internal(internal) = node {
                let left_children = if found { index + 1 } else { index };
                rank += internal.children()[..left_children]
                    .iter()
                    .map(|&child| self.nodes.get(child).subtree_count())
                    .sum::<usize>();
            }

            if found {
                return (rank, true);
            }
            match node.child(index) {
                Some(child) => current = child,
                None => return (rank, false),
            }
        }
    }

    /// Number of keys strictly less than `key`.
    pub(crate) fn get_rank(&self, key: &T) -> usize {
        self.rank_search(key).0
    }

    /// Number of keys less than or equal to `key`.
    pub(crate) fn upper_rank(&self, key: &T) -> usize {
        let (rank, found) = self.rank_search(key);
        rank + usize::from(found)
    }

    /// Rank of `key` if it is stored.
    pub(crate) fn rank_of(&self, key: &T) -> Option<usize> {
        match self.rank_search(key) {
            (rank, true) => Some(rank),
            (_, false) => None,
        }
    }

    /// Inserts `key`. Returns `false`, leaving the tree untouched, if an equal key is present.
    pub(crate) fn insert(&mut self, key: T) -> bool {
        let Some(root) = self.root else {
            self.root = Some(self.nodes.alloc(Node::leaf_with(key)));
            self.len = 1;
            self.height = 1;
            return true;
        };

        let mut path = Path::new();
        if self.locate(root, &key, &mut path) {
            return false;
        }

        let leaf = path.pop().expect("`RawBPTree::insert()` - empty path!");
        self.nodes.get_mut(leaf.node).as_leaf_mut().insert(leaf.index, key);
        self.len += 1;
        for elem in &path {
            self.nodes.get_mut(elem.node).add_count(1);
        }

        if self.nodes.get(leaf.node).is_overfull() {
            self.split_and_propagate(leaf.node, &mut path);
        }
        true
    }

    /// Splits an overfull node and keeps splitting ancestors that overflow in turn.
    ///
    /// Splits conserve keys, so the parent's cached count stays as it was; only the two halves
    /// need fresh counts.
    fn split_and_propagate(&mut self, node: Handle, path: &mut Path) {
        let mut current = node;
        loop {
            let total = self.nodes.get(current).subtree_count();
            let (median, mut right) = self.nodes.get_mut(current).split();
            if let Node::Internal(internal) = &mut right {
                internal.recount(&self.nodes);
            }
            let right_count = right.subtree_count();
            if let Node::Internal(left) = self.nodes.get_mut(current) {
                left.set_tree_count(total - 1 - right_count);
            }
            let right = self.nodes.alloc(right);

            let Some(parent) = path.pop() else {
                let new_root = InternalNode::new_root(current, median, right, total);
                self.root = Some(self.nodes.alloc(Node::Internal(new_root)));
                self.height += 1;
                tracing::trace!(height = self.height, "root split");
                return;
            };

            let parent_node = self.nodes.get_mut(parent.node);
            parent_node.as_internal_mut().insert_child(parent.index, median, right);
            if !parent_node.is_overfull() {
                return;
            }
            current = parent.node;
        }
    }

    /// Removes `key` and returns it, or `None` if absent.
    pub(crate) fn take(&mut self, key: &T) -> Option<T> {
        let root = self.root?;
        let mut path = Path::new();
        if !self.locate(root, key, &mut path) {
            return None;
        }
        Some(self.remove_at(path))
    }
}

impl<T: Clone, P> Clone for RawBPTree<T, P> {
    fn clone(&self) -> Self {
        let mut nodes = Arena::with_capacity(self.nodes.len());
        let root = self.root.map(|root| Node::clone_subtree(&self.nodes, &mut nodes, root));
        Self {
            nodes,
            root,
            len: self.len,
            height: self.height,
            policy: PhantomData,
        }
    }
}

#[cfg(any(test, feature = "validate"))]
mod validate {
    use alloc::format;
    use alloc::vec::Vec;
    use core::cmp::Ordering;

    use super::RawBPTree;
    use crate::error::{Error, Result};
    use crate::policy::OrderPolicy;
    use crate::raw::arena::Arena;
    use crate::raw::node::{MAX_ITEMS, MIN_ITEMS, Node};

    fn corrupted(message: alloc::string::String) -> Result<()> {
        Err(Error::Corrupted(message))
    }

    impl<T, P: OrderPolicy<T>> RawBPTree<T, P> {
        /// Walks the whole tree and checks every structural invariant, recomputing subtree counts
        /// from scratch instead of trusting the cached ones.
        pub(crate) fn validate(&self) -> Result<()> {
            let Some(root) = self.root else {
                if self.len != 0 || self.height != 0 || !self.nodes.is_empty() || self.nodes.used() != 0 {
                    return corrupted(format!(
                        "empty tree with len={}, height={}, nodes={}, bytes={}",
                        self.len,
                        self.height,
                        self.nodes.len(),
                        self.nodes.used()
                    ));
                }
                return Ok(());
            };

            // (node, depth, exclusive lower bound, exclusive upper bound)
            let mut stack = Vec::new();
            stack.push((root, 0usize, None::<&T>, None::<&T>));
            let mut visited = 0usize;

            while let Some((handle, depth, lower, upper)) = stack.pop() {
                visited += 1;
                let node = self.nodes.get(handle);
                let keys = node.keys();

                let occupancy = if handle == root { 1..=MAX_ITEMS } else { MIN_ITEMS..=MAX_ITEMS };
                if !occupancy.contains(&keys.len()) {
                    return corrupted(format!("node {handle:?} at depth {depth} holds {} keys", keys.len()));
                }

                if keys.windows(2).any(|pair| P::compare(&pair[0], &pair[1]) != Ordering::Less) {
                    return corrupted(format!("keys of node {handle:?} are not strictly increasing"));
                }
                if let Some(lower) = lower
                    && P::compare(lower, &keys[0]) != Ordering::Less
                {
                    return corrupted(format!("node {handle:?} has a key at or below its left separator"));
                }
                if let Some(upper) = upper
                    && P::compare(&keys[keys.len() - 1], upper) != Ordering::Less
                {
                    return corrupted(format!("node {handle:?} has a key at or above its right separator"));
                }

                match node {
                    Node::Leaf(_) => {
                        if depth + 1 != self.height {
                            return corrupted(format!(
                                "leaf {handle:?} at depth {depth} in a tree of height {}",
                                self.height
                            ));
                        }
                    }
                    Node::Internal(internal) => {
                        if internal.child_count() != keys.len() + 1 {
                            return corrupted(format!(
                                "node {handle:?} has {} keys but {} children",
                                keys.len(),
                                internal.child_count()
                            ));
                        }
                        let actual = node.debug_tree_count(&self.nodes);
                        if internal.tree_count() != actual {
                            return corrupted(format!(
                                "node {handle:?} caches count {} but holds {actual} keys",
                                internal.tree_count()
                            ));
                        }
                        for (i, &child) in internal.children().iter().enumerate() {
                            let child_lower = if i == 0 { lower } else { Some(&keys[i - 1]) };
                            let child_upper = keys.get(i).or(upper);
                            stack.push((child, depth + 1, child_lower, child_upper));
                        }
                    }
                }
            }

            let root_count = self.nodes.get(root).subtree_count();
            if root_count != self.len {
                return corrupted(format!("root counts {root_count} keys but len is {}", self.len));
            }
            if visited != self.nodes.len() {
                return corrupted(format!("{visited} reachable nodes but {} allocated", self.nodes.len()));
            }
            if self.nodes.used() != visited * Arena::<Node<T>>::BLOCK_SIZE {
                return corrupted(format!("arena reports {} bytes for {visited} nodes", self.nodes.used()));
            }
            Ok(())
        }
    }
}
