//! Splay Tree implementation
//!
//! A self-adjusting binary search tree. Every access (`insert`, `search`,
//! `delete`, `min`, `max`) splays the touched node to the root through a
//! sequence of zig, zig-zig and zig-zag steps, giving O(log n) amortized
//! cost per operation. No balance information is stored.
//!
//! Keys are unique: inserting a key that is already present splays the
//! existing node and leaves the tree's contents unchanged.

use crate::snapshot::{Inspect, NodeSnapshot, Snapshot};
use crate::storage::{NodeId, NodeKey, NodeStore, StoredNode};
use log::{debug, trace};
use smallvec::SmallVec;
use std::cmp::Ordering;

const LEFT: usize = 0;
const RIGHT: usize = 1;

#[derive(Debug)]
struct Node<K> {
    id: NodeId,
    key: K,
    parent: Option<NodeKey>,
    children: [Option<NodeKey>; 2],
}

impl<K> StoredNode for Node<K> {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// Splay Tree
///
/// # Example
///
/// ```rust
/// use meldable_heaps::SplayTree;
///
/// let mut tree: SplayTree<i32> = [50, 30, 70, 20, 40].into_iter().collect();
/// assert!(tree.search(&30));
/// assert_eq!(tree.root(), Some(&30));
/// assert!(!tree.search(&35));
/// assert!(tree.delete(&30));
/// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![20, 40, 50, 70]);
/// ```
#[derive(Debug)]
pub struct SplayTree<K: Ord> {
    store: NodeStore<Node<K>>,
    root: Option<NodeKey>,
    rotations: u64,
}

impl<K: Ord> SplayTree<K> {
    /// Creates an empty tree
    pub fn new() -> Self {
        SplayTree {
            store: NodeStore::new(),
            root: None,
            rotations: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Key at the root, i.e. the most recently accessed key
    pub fn root(&self) -> Option<&K> {
        self.root.map(|root| &self.store[root].key)
    }

    /// Total number of single rotations performed since construction
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Number of nodes on the longest root-to-leaf path; 0 for an empty tree
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(NodeKey, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((node, depth)) = stack.pop() {
            height = height.max(depth);
            for child in self.store[node].children.into_iter().flatten() {
                stack.push((child, depth + 1));
            }
        }
        height
    }

    /// Inserts `key` and splays its node to the root
    ///
    /// Returns `false` if the key was already present; the existing node is
    /// splayed instead.
    pub fn insert(&mut self, key: K) -> bool {
        let Some(mut current) = self.root else {
            let node = self.allocate(key);
            self.root = Some(node);
            return true;
        };

        loop {
            let dir = match key.cmp(&self.store[current].key) {
                Ordering::Less => LEFT,
                Ordering::Greater => RIGHT,
                Ordering::Equal => {
                    trace!("splay: {} already present", self.store.id(current));
                    self.splay(current);
                    return false;
                }
            };
            match self.store[current].children[dir] {
                Some(child) => current = child,
                None => {
                    let node = self.allocate(key);
                    self.link(current, Some(node), dir);
                    self.splay(node);
                    return true;
                }
            }
        }
    }

    /// Looks up `key`, splaying the last node on the search path
    ///
    /// When the key is absent the new root holds its in-order predecessor
    /// or successor.
    pub fn search(&mut self, key: &K) -> bool {
        let Some((node, ordering)) = self.descend(key) else {
            return false;
        };
        self.splay(node);
        ordering == Ordering::Equal
    }

    /// Same as [`search`](Self::search); the tree is restructured either way
    pub fn contains(&mut self, key: &K) -> bool {
        self.search(key)
    }

    /// Removes `key`, returning whether it was present
    ///
    /// The tree is splayed around `key` even when it is absent.
    pub fn delete(&mut self, key: &K) -> bool {
        if !self.search(key) {
            return false;
        }
        let Some(root) = self.root else {
            return false;
        };

        let node = self.store.remove(root);
        let [left, right] = node.children;
        match left {
            None => {
                self.root = right;
                if let Some(right) = right {
                    self.store[right].parent = None;
                }
            }
            Some(left) => {
                // Join: the maximum of the left subtree has no right child
                // once splayed, so the right subtree hangs there
                self.store[left].parent = None;
                self.root = Some(left);
                let max = self.extreme(left, RIGHT);
                self.splay(max);
                debug_assert!(self.store[max].children[RIGHT].is_none());
                self.link(max, right, RIGHT);
            }
        }
        debug!("splay: deleted {}, {} nodes left", node.id, self.len());
        true
    }

    /// Splays the smallest key to the root and returns it
    pub fn min(&mut self) -> Option<&K> {
        let node = self.extreme(self.root?, LEFT);
        self.splay(node);
        Some(&self.store[node].key)
    }

    /// Splays the largest key to the root and returns it
    pub fn max(&mut self) -> Option<&K> {
        let node = self.extreme(self.root?, RIGHT);
        self.splay(node);
        Some(&self.store[node].key)
    }

    /// In-order iterator over the keys; does not splay
    pub fn iter(&self) -> Iter<'_, K> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
            remaining: self.len(),
        };
        iter.push_left_spine(self.root);
        iter
    }

    fn allocate(&mut self, key: K) -> NodeKey {
        self.store.insert_with(|id| Node {
            id,
            key,
            parent: None,
            children: [None, None],
        })
    }

    /// Last node on the search path for `key`, with how `key` compares to it
    fn descend(&self, key: &K) -> Option<(NodeKey, Ordering)> {
        let mut current = self.root?;
        loop {
            let ordering = key.cmp(&self.store[current].key);
            let dir = match ordering {
                Ordering::Less => LEFT,
                Ordering::Greater => RIGHT,
                Ordering::Equal => return Some((current, ordering)),
            };
            match self.store[current].children[dir] {
                Some(child) => current = child,
                None => return Some((current, ordering)),
            }
        }
    }

    /// Follows `dir` links from `node` as far as they go
    fn extreme(&self, mut node: NodeKey, dir: usize) -> NodeKey {
        while let Some(child) = self.store[node].children[dir] {
            node = child;
        }
        node
    }

    /// Links `p` and `c` as parent and child in direction `dir`
    fn link(&mut self, p: NodeKey, c: Option<NodeKey>, dir: usize) {
        self.store[p].children[dir] = c;
        if let Some(c) = c {
            self.store[c].parent = Some(p);
        }
    }

    fn direction(&self, parent: NodeKey, child: NodeKey) -> usize {
        if self.store[parent].children[LEFT] == Some(child) {
            LEFT
        } else {
            RIGHT
        }
    }

    /// Rotates `c` above its parent `p`
    fn rotate(&mut self, p: NodeKey, c: NodeKey) {
        let g = self.store[p].parent;
        let dir = self.direction(p, c);

        // The inner subtree of `c` changes sides
        let inner = self.store[c].children[dir ^ 1];
        self.link(p, inner, dir);
        self.link(c, Some(p), dir ^ 1);

        match g {
            None => {
                self.root = Some(c);
                self.store[c].parent = None;
            }
            Some(g) => {
                let gdir = self.direction(g, p);
                self.link(g, Some(c), gdir);
            }
        }
        self.rotations += 1;
    }

    /// Moves `c` to the root
    fn splay(&mut self, c: NodeKey) {
        while let Some(p) = self.store[c].parent {
            let Some(g) = self.store[p].parent else {
                trace!("splay: zig {}", self.store.id(c));
                self.rotate(p, c);
                break;
            };

            if self.direction(g, p) == self.direction(p, c) {
                trace!("splay: zig-zig {}", self.store.id(c));
                self.rotate(g, p);
                self.rotate(p, c);
            } else {
                trace!("splay: zig-zag {}", self.store.id(c));
                self.rotate(p, c);
                self.rotate(g, c);
            }
        }
    }

    fn children(&self, node: NodeKey) -> SmallVec<[NodeKey; 4]> {
        self.store[node].children.into_iter().flatten().collect()
    }
}

/// In-order iterator over a [`SplayTree`]'s keys
pub struct Iter<'a, K: Ord> {
    tree: &'a SplayTree<K>,
    stack: Vec<NodeKey>,
    remaining: usize,
}

impl<'a, K: Ord> Iter<'a, K> {
    fn push_left_spine(&mut self, mut node: Option<NodeKey>) {
        while let Some(key) = node {
            self.stack.push(key);
            node = self.tree.store[key].children[LEFT];
        }
    }
}

impl<'a, K: Ord> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let node = self.stack.pop()?;
        let tree = self.tree;
        self.push_left_spine(tree.store[node].children[RIGHT]);
        self.remaining -= 1;
        Some(&tree.store[node].key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Ord> ExactSizeIterator for Iter<'_, K> {}

impl<'a, K: Ord> IntoIterator for &'a SplayTree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

impl<K: Ord + Clone> Inspect for SplayTree<K> {
    type Key = K;

    fn snapshot(&self) -> Snapshot<K> {
        let Some(root) = self.root else {
            return Snapshot::empty();
        };
        let store = &self.store;
        let nodes = store
            .preorder(&[root], |key| self.children(key))
            .into_iter()
            .map(|key| {
                let node = &store[key];
                let [left, right] = node.children.map(|c| c.map(|c| store.id(c)));
                NodeSnapshot::new(node.id, node.key.clone(), node.parent.map(|p| store.id(p)))
                    .with_slots(left, right)
            })
            .collect();
        Snapshot {
            nodes,
            roots: vec![store.id(root)],
            min: Some(store.id(self.extreme(root, LEFT))),
            size: self.len(),
        }
    }
}

impl<K: Ord> Default for SplayTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> Extend<K> for SplayTree<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord> FromIterator<K> for SplayTree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}
