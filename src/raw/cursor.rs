use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::Node;

/// One level of a root-to-key descent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct PathElement {
    /// Handle to the node at this level.
    pub(crate) node: Handle,
    /// Child index we descended through, or the key index at the deepest level.
    pub(crate) index: usize,
}

/// Stack of path elements, root first.
pub(crate) type Path = SmallVec<[PathElement; 16]>;

/// Pushes the path to the smallest key under `from`.
pub(crate) fn descend_leftmost<T>(nodes: &Arena<Node<T>>, path: &mut Path, from: Handle) {
    let mut current = from;
    loop {
        path.push(PathElement {
            node: current,
            index: 0,
        });
        match nodes.get(current).child(0) {
            Some(child) => current = child,
            None => return,
        }
    }
}

/// Pushes the path to the largest key under `from`.
pub(crate) fn descend_rightmost<T>(nodes: &Arena<Node<T>>, path: &mut Path, from: Handle) {
    let mut current = from;
    loop {
        let node = nodes.get(current);
        let items = node.item_count();
        if let Some(child) = node.child(items) {
            path.push(PathElement {
                node: current,
                index: items,
            });
            current = child;
        } else {
            path.push(PathElement {
                node: current,
                index: items - 1,
            });
            return;
        }
    }
}

/// A position on one key, held as the full descent path so that in-order neighbours are reached
/// without parent pointers.
///
/// Every element but the last records the child we went through; the last element records the key.
/// Moving off the last key in either direction empties the path.
#[derive(Clone, Debug)]
pub(crate) struct Cursor {
    path: Path,
}

impl Cursor {
    pub(crate) fn first<T>(nodes: &Arena<Node<T>>, root: Handle) -> Self {
        let mut path = Path::new();
        descend_leftmost(nodes, &mut path, root);
        Self { path }
    }

    pub(crate) fn last<T>(nodes: &Arena<Node<T>>, root: Handle) -> Self {
        let mut path = Path::new();
        descend_rightmost(nodes, &mut path, root);
        Self { path }
    }

    /// Positions on the key with zero-based ascending position `rank`.
    ///
    /// `rank` must be below the root's subtree count.
    pub(crate) fn seek_rank<T>(nodes: &Arena<Node<T>>, root: Handle, rank: usize) -> Self {
        let mut path = Path::new();
        let mut current = root;
        let mut remaining = rank;

        loop {
            let node = nodes.get(current);
            let Node::Internal(internal) = node else {
                debug_assert!(remaining < node.item_count(), "`Cursor::seek_rank()` - rank past leaf end");
                path.push(PathElement {
                    node: current,
                    index: remaining,
                });
                return Self { path };
            };

            let mut next = None;
            for (i, &child) in internal.children().iter().enumerate() {
                let child_count = nodes.get(child).subtree_count();
                if remaining < child_count {
                    path.push(PathElement { node: current, index: i });
                    next = Some(child);
                    break;
                }
                remaining -= child_count;

                // The separator following child `i`.
                if i < node.item_count() {
                    if remaining == 0 {
                        path.push(PathElement { node: current, index: i });
                        return Self { path };
                    }
                    remaining -= 1;
                }
            }
            current = next.expect("`Cursor::seek_rank()` - rank exceeds subtree count!");
        }
    }

    /// Key under the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor has moved past either end.
    pub(crate) fn key<'a, T>(&self, nodes: &'a Arena<Node<T>>) -> &'a T {
        let last = self.path.last().expect("`Cursor::key()` - cursor is exhausted!");
        nodes.get(last.node).key(last.index)
    }

    /// Moves to the in-order successor. Returns `false` once past the largest key.
    pub(crate) fn advance<T>(&mut self, nodes: &Arena<Node<T>>) -> bool {
        let Some(last) = self.path.last_mut() else {
            return false;
        };
        let node = nodes.get(last.node);

        // Internal key: the successor is the leftmost key of the right subtree.
        if let Some(right) = node.child(last.index + 1) {
            last.index += 1;
            descend_leftmost(nodes, &mut self.path, right);
            return true;
        }

        if last.index + 1 < node.item_count() {
            last.index += 1;
            return true;
        }

        // Leaf exhausted: climb to the first ancestor with a key right of our child.
        self.path.pop();
        while let Some(elem) = self.path.last() {
            if elem.index < nodes.get(elem.node).item_count() {
                return true;
            }
            self.path.pop();
        }
        false
    }

    /// Moves to the in-order predecessor. Returns `false` once past the smallest key.
    pub(crate) fn retreat<T>(&mut self, nodes: &Arena<Node<T>>) -> bool {
        let Some(last) = self.path.last_mut() else {
            return false;
        };
        let node = nodes.get(last.node);

        // Internal key: the predecessor is the rightmost key of the left subtree.
        if let Some(left) = node.child(last.index) {
            descend_rightmost(nodes, &mut self.path, left);
            return true;
        }

        if last.index > 0 {
            last.index -= 1;
            return true;
        }

        self.path.pop();
        while let Some(elem) = self.path.last_mut() {
            if elem.index > 0 {
                elem.index -= 1;
                return true;
            }
            self.path.pop();
        }
        false
    }

    pub(crate) fn into_path(self) -> Path {
        self.path
    }
}
