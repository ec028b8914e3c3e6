//! Fibonacci Heap implementation
//!
//! A Fibonacci heap is a data structure for priority queue operations with:
//! - O(1) merge
//! - O(1) amortized insert, decrease_key
//! - O(log n) amortized extract_min
//!
//! The structure consists of a collection of heap-ordered trees whose roots
//! form an unordered root list. Insertion just adds a singleton tree; all the
//! tidying up is deferred to `extract_min`, which consolidates the root list
//! until no two roots share a degree.
//!
//! `decrease_key` cuts a node whose new key undercuts its parent and moves it
//! to the root list. A non-root node that loses a second child is cut as well
//! (cascading cut); the `marked` flag records the first loss.

use crate::snapshot::{Inspect, NodeSnapshot, Snapshot};
use crate::storage::{NodeId, NodeKey, NodeStore, StoredNode};
use crate::traits::{HeapError, MeldableHeap, NodeRef};
use log::{debug, trace};
use smallvec::SmallVec;

#[derive(Debug)]
struct Node<K> {
    id: NodeId,
    key: K,
    parent: Option<NodeKey>,
    /// First node of the child ring
    child: Option<NodeKey>,
    /// Ring neighbours; a lone node points at itself
    left: NodeKey,
    right: NodeKey,
    degree: usize,
    marked: bool,
}

impl<K> StoredNode for Node<K> {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// Fibonacci Heap
///
/// Roots and each node's children form circular doubly linked rings, so
/// merging two root lists, promoting a child list and cutting a node out of
/// its siblings are all constant-time splices.
///
/// # Example
///
/// ```rust
/// use meldable_heaps::fibonacci::FibonacciHeap;
/// use meldable_heaps::MeldableHeap;
///
/// let mut heap = FibonacciHeap::new();
/// let handle = heap.insert(5);
/// heap.insert(3);
/// heap.decrease_key(&handle, 1).unwrap();
/// assert_eq!(heap.extract_min(), Ok(1));
/// assert_eq!(heap.find_min(), Ok(&3));
/// ```
#[derive(Debug)]
pub struct FibonacciHeap<K: Ord> {
    store: NodeStore<Node<K>>,
    /// First node of the root ring
    roots: Option<NodeKey>,
    min: Option<NodeKey>,
}

impl<K: Ord> MeldableHeap<K> for FibonacciHeap<K> {
    fn new() -> Self {
        Self {
            store: NodeStore::new(),
            roots: None,
            min: None,
        }
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn insert(&mut self, key: K) -> NodeRef {
        let node = self.store.insert_with_key(|id, own| Node {
            id,
            key,
            parent: None,
            child: None,
            left: own,
            right: own,
            degree: 0,
            marked: false,
        });
        self.roots = self.splice(self.roots, Some(node));
        self.update_min(node);
        trace!("fibonacci: inserted {} into root list", self.store.id(node));
        self.store.handle(node)
    }

    fn find_min(&self) -> Result<&K, HeapError> {
        self.min
            .map(|min| &self.store[min].key)
            .ok_or(HeapError::EmptyHeap)
    }

    fn min_node(&self) -> Option<NodeRef> {
        self.min.map(|min| self.store.handle(min))
    }

    fn extract_min(&mut self) -> Result<K, HeapError> {
        let min = self.min.ok_or(HeapError::EmptyHeap)?;

        // Promote children to the root list
        let children = self.store[min].child.take();
        for child in self.ring(children) {
            let node = &mut self.store[child];
            node.parent = None;
            node.marked = false;
        }

        let next = self.unlink(min);
        if self.roots == Some(min) {
            self.roots = next;
        }
        self.roots = self.splice(self.roots, children);

        let node = self.store.remove(min);
        trace!("fibonacci: extracted {}", node.id);

        if self.roots.is_none() {
            self.min = None;
        } else {
            self.consolidate();
        }

        Ok(node.key)
    }

    fn merge(&mut self, other: Self) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other;
            return;
        }

        let FibonacciHeap { store, roots, min } = other;
        self.store.append(store);
        self.roots = self.splice(self.roots, roots);
        if let Some(other_min) = min {
            self.update_min(other_min);
        }
        debug!("fibonacci: merged, {} nodes", self.len());
    }

    fn decrease_key(&mut self, node: &NodeRef, new_key: K) -> Result<(), HeapError> {
        let node = self
            .store
            .resolve(node)
            .ok_or(HeapError::NodeNotOwned)?;
        if new_key > self.store[node].key {
            return Err(HeapError::InvalidKey);
        }

        self.store[node].key = new_key;

        if let Some(parent) = self.store[node].parent {
            if self.store[node].key < self.store[parent].key {
                self.cut(node, parent);
                self.cascading_cut(parent);
            }
        }

        if self.store[node].parent.is_none() {
            self.update_min(node);
        }
        Ok(())
    }

    fn contains(&self, node: &NodeRef) -> bool {
        self.store.resolve(node).is_some()
    }

    fn key(&self, node: &NodeRef) -> Result<&K, HeapError> {
        self.store
            .resolve(node)
            .map(|node| &self.store[node].key)
            .ok_or(HeapError::NodeNotOwned)
    }
}

impl<K: Ord> FibonacciHeap<K> {
    /// Points `min` at `root` if it holds a strictly smaller key
    fn update_min(&mut self, root: NodeKey) {
        debug_assert!(self.store[root].parent.is_none());
        match self.min {
            Some(min) if self.store[min].key <= self.store[root].key => {}
            _ => self.min = Some(root),
        }
    }

    /// Concatenates ring `b` after the last node of ring `a`, returning the
    /// head of the combined ring
    fn splice(&mut self, a: Option<NodeKey>, b: Option<NodeKey>) -> Option<NodeKey> {
        let (Some(a), Some(b)) = (a, b) else {
            return a.or(b);
        };
        let a_tail = self.store[a].left;
        let b_tail = self.store[b].left;
        self.store[a_tail].right = b;
        self.store[b].left = a_tail;
        self.store[b_tail].right = a;
        self.store[a].left = b_tail;
        Some(a)
    }

    /// Removes `node` from its ring, leaving it a lone ring
    ///
    /// Returns the node that followed it, or `None` if it was alone.
    fn unlink(&mut self, node: NodeKey) -> Option<NodeKey> {
        let (left, right) = (self.store[node].left, self.store[node].right);
        if right == node {
            return None;
        }
        self.store[left].right = right;
        self.store[right].left = left;
        let lone = &mut self.store[node];
        lone.left = node;
        lone.right = node;
        Some(right)
    }

    /// Nodes of the ring starting at `head`, in ring order
    fn ring(&self, head: Option<NodeKey>) -> SmallVec<[NodeKey; 4]> {
        let mut nodes = SmallVec::new();
        let Some(head) = head else {
            return nodes;
        };
        let mut current = head;
        loop {
            nodes.push(current);
            current = self.store[current].right;
            if current == head {
                return nodes;
            }
        }
    }

    /// Links trees of equal degree until every root degree is distinct,
    /// then rescans the roots for the minimum
    fn consolidate(&mut self) {
        let head = self.roots.take();
        let roots = self.ring(head);
        let before = roots.len();
        let mut by_degree: SmallVec<[Option<NodeKey>; 32]> = SmallVec::new();

        for root in roots {
            let lone = &mut self.store[root];
            lone.left = root;
            lone.right = root;

            let mut x = root;
            let mut degree = self.store[x].degree;
            loop {
                if by_degree.len() <= degree {
                    by_degree.resize(degree + 1, None);
                }
                match by_degree[degree].take() {
                    None => {
                        by_degree[degree] = Some(x);
                        break;
                    }
                    Some(mut y) => {
                        // Ensure x has the smaller key
                        if self.store[y].key < self.store[x].key {
                            std::mem::swap(&mut x, &mut y);
                        }
                        self.link(y, x);
                        degree += 1;
                    }
                }
            }
        }

        self.min = None;
        let mut after = 0;
        for root in by_degree.into_iter().flatten() {
            self.roots = self.splice(self.roots, Some(root));
            self.update_min(root);
            after += 1;
        }
        debug!("fibonacci: consolidated {} roots into {}", before, after);
    }

    /// Links lone root `child` below root `parent`
    fn link(&mut self, child: NodeKey, parent: NodeKey) {
        let node = &mut self.store[child];
        node.parent = Some(parent);
        node.marked = false;
        let children = self.store[parent].child;
        let children = self.splice(children, Some(child));
        let parent_node = &mut self.store[parent];
        parent_node.child = children;
        parent_node.degree += 1;
        trace!(
            "fibonacci: linked {} under {}",
            self.store.id(child),
            self.store.id(parent)
        );
    }

    /// Detaches `node` from `parent` and adds it to the root list
    fn cut(&mut self, node: NodeKey, parent: NodeKey) {
        let next = self.unlink(node);
        let parent_node = &mut self.store[parent];
        if parent_node.child == Some(node) {
            parent_node.child = next;
        }
        parent_node.degree -= 1;

        let detached = &mut self.store[node];
        detached.parent = None;
        detached.marked = false;
        self.roots = self.splice(self.roots, Some(node));
        trace!(
            "fibonacci: cut {} from {}",
            self.store.id(node),
            self.store.id(parent)
        );
    }

    /// Marks `node` on its first child loss, cuts it on the second and
    /// continues upwards; roots are never marked
    fn cascading_cut(&mut self, mut node: NodeKey) {
        while let Some(parent) = self.store[node].parent {
            if !self.store[node].marked {
                self.store[node].marked = true;
                trace!("fibonacci: marked {}", self.store.id(node));
                return;
            }
            self.cut(node, parent);
            node = parent;
        }
    }
}

impl<K: Ord + Clone> Inspect for FibonacciHeap<K> {
    type Key = K;

    fn snapshot(&self) -> Snapshot<K> {
        let store = &self.store;
        let roots = self.ring(self.roots);
        let order = store.preorder(&roots, |key| self.ring(store[key].child));
        let nodes = order
            .into_iter()
            .map(|key| {
                let node = &store[key];
                let mut snap = NodeSnapshot::new(
                    node.id,
                    node.key.clone(),
                    node.parent.map(|p| store.id(p)),
                );
                snap.children = self.ring(node.child).iter().map(|&c| store.id(c)).collect();
                snap.marked = Some(node.marked);
                snap.degree = Some(node.degree);
                snap
            })
            .collect();
        Snapshot {
            nodes,
            roots: roots.iter().map(|&r| store.id(r)).collect(),
            min: self.min.map(|m| store.id(m)),
            size: self.len(),
        }
    }
}

impl<K: Ord> Default for FibonacciHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> Extend<K> for FibonacciHeap<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord> FromIterator<K> for FibonacciHeap<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut heap = Self::new();
        heap.extend(iter);
        heap
    }
}
