//! Detached snapshots of heap and tree structure
//!
//! A [`Snapshot`] is a plain value describing every live node of a structure:
//! its stable id, key, parent and ordered children, plus the bookkeeping a
//! variant keeps (Fibonacci marks and degrees, leftist ranks, binary
//! left/right slots). Nothing in a snapshot points back into the live
//! structure, so a renderer may keep it for as long as it likes.
//!
//! [`ObservedHeap`] and [`ObservedTree`] wrap a structure and hand a fresh
//! snapshot to a callback after every successful mutating operation.

use crate::splay::SplayTree;
use crate::storage::NodeId;
use crate::traits::{HeapError, MeldableHeap, NodeRef};
use rustc_hash::FxHashMap;

/// One node as seen by a renderer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeSnapshot<K> {
    pub id: NodeId,
    pub key: K,
    /// Direct children, in structural order
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Left slot of a binary node (skew, leftist, splay); `None` elsewhere
    pub left: Option<NodeId>,
    /// Right slot of a binary node (skew, leftist, splay); `None` elsewhere
    pub right: Option<NodeId>,
    /// Fibonacci heap only
    pub marked: Option<bool>,
    /// Fibonacci heap only
    pub degree: Option<usize>,
    /// Leftist heap only: length of the right spine
    pub rank: Option<usize>,
}

impl<K> NodeSnapshot<K> {
    pub(crate) fn new(id: NodeId, key: K, parent: Option<NodeId>) -> Self {
        NodeSnapshot {
            id,
            key,
            children: Vec::new(),
            parent,
            left: None,
            right: None,
            marked: None,
            degree: None,
            rank: None,
        }
    }

    /// Fills `left`/`right` and derives `children` from them
    pub(crate) fn with_slots(mut self, left: Option<NodeId>, right: Option<NodeId>) -> Self {
        self.left = left;
        self.right = right;
        self.children = left.into_iter().chain(right).collect();
        self
    }
}

/// Immutable view of a whole structure
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot<K> {
    /// All reachable nodes, pre-order from each root in `roots` order
    pub nodes: Vec<NodeSnapshot<K>>,
    pub roots: Vec<NodeId>,
    /// The minimum node (heaps) or leftmost node (splay tree)
    pub min: Option<NodeId>,
    /// The structure's own size counter at the time of the snapshot
    pub size: usize,
}

impl<K> Snapshot<K> {
    pub(crate) fn empty() -> Self {
        Snapshot {
            nodes: Vec::new(),
            roots: Vec::new(),
            min: None,
            size: 0,
        }
    }

    /// Looks up a node by id
    pub fn node(&self, id: NodeId) -> Option<&NodeSnapshot<K>> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Keys of all nodes, in snapshot order
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.nodes.iter().map(|n| &n.key)
    }

    fn by_id(&self) -> FxHashMap<NodeId, &NodeSnapshot<K>> {
        self.nodes.iter().map(|n| (n.id, n)).collect()
    }

    /// Checks the structural bookkeeping of the snapshot
    ///
    /// - `size` equals the number of reachable nodes and ids are unique
    /// - every root has no parent, every child names its parent back
    /// - `min` (if any) is one of the nodes
    /// - recorded degrees match the child counts, roots are never marked
    pub fn is_well_formed(&self) -> bool {
        let nodes = self.by_id();
        if nodes.len() != self.nodes.len() || self.size != self.nodes.len() {
            return false;
        }
        if self.min.is_some_and(|min| !nodes.contains_key(&min)) {
            return false;
        }
        let roots_ok = self.roots.iter().all(|root| {
            nodes
                .get(root)
                .is_some_and(|n| n.parent.is_none() && n.marked != Some(true))
        });
        let links_ok = self.nodes.iter().all(|n| {
            n.degree.map_or(true, |d| d == n.children.len())
                && n.children
                    .iter()
                    .all(|c| nodes.get(c).is_some_and(|child| child.parent == Some(n.id)))
        });
        roots_ok && links_ok
    }
}

impl<K: Ord> Snapshot<K> {
    /// Every node's key is at least its parent's key, and `min` holds the smallest key
    pub fn is_heap_ordered(&self) -> bool {
        let nodes = self.by_id();
        let ordered = self.nodes.iter().all(|n| {
            n.parent
                .and_then(|p| nodes.get(&p))
                .map_or(true, |parent| parent.key <= n.key)
        });
        let min_ok = match self.min.and_then(|m| nodes.get(&m)) {
            Some(min) => self.nodes.iter().all(|n| min.key <= n.key),
            None => self.nodes.is_empty(),
        };
        ordered && min_ok
    }

    /// The in-order key sequence of the binary tree is strictly increasing
    pub fn is_search_ordered(&self) -> bool {
        let nodes = self.by_id();
        let mut previous: Option<&K> = None;
        let mut stack: Vec<&NodeSnapshot<K>> = Vec::new();
        let mut current = self.roots.first().and_then(|r| nodes.get(r)).copied();
        let mut visited = 0;
        loop {
            while let Some(node) = current {
                stack.push(node);
                current = node.left.and_then(|l| nodes.get(&l)).copied();
            }
            let Some(node) = stack.pop() else { break };
            if previous.is_some_and(|p| p >= &node.key) {
                return false;
            }
            previous = Some(&node.key);
            visited += 1;
            current = node.right.and_then(|r| nodes.get(&r)).copied();
        }
        visited == self.nodes.len()
    }
}

/// Structures that can produce a [`Snapshot`] of themselves
pub trait Inspect {
    type Key: Clone;

    /// Builds a detached view of the current structure
    fn snapshot(&self) -> Snapshot<Self::Key>;
}

/// The mutating operation that triggered a snapshot emission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    Insert,
    ExtractMin,
    Merge,
    DecreaseKey,
    Search,
    Delete,
}

/// A heap that reports a snapshot to `observer` after each successful mutation
///
/// # Example
///
/// ```rust
/// use meldable_heaps::pairing::PairingHeap;
/// use meldable_heaps::snapshot::{ObservedHeap, Operation, Snapshot};
/// use meldable_heaps::MeldableHeap;
///
/// let mut frames = Vec::new();
/// let mut heap = ObservedHeap::new(PairingHeap::<i32>::new(), |op, snap: &Snapshot<i32>| {
///     frames.push((op, snap.size))
/// });
/// heap.insert(3);
/// heap.insert(1);
/// heap.extract_min().unwrap();
/// drop(heap);
/// assert_eq!(frames, vec![(Operation::Insert, 1), (Operation::Insert, 2), (Operation::ExtractMin, 1)]);
/// ```
pub struct ObservedHeap<H, F> {
    inner: H,
    observer: F,
}

impl<H, F> ObservedHeap<H, F>
where
    H: Inspect + MeldableHeap<<H as Inspect>::Key>,
    H::Key: Ord,
    F: FnMut(Operation, &Snapshot<H::Key>),
{
    pub fn new(inner: H, observer: F) -> Self {
        ObservedHeap { inner, observer }
    }

    fn emit(&mut self, operation: Operation) {
        let snapshot = self.inner.snapshot();
        (self.observer)(operation, &snapshot);
    }

    pub fn insert(&mut self, key: H::Key) -> NodeRef {
        let node = self.inner.insert(key);
        self.emit(Operation::Insert);
        node
    }

    pub fn extract_min(&mut self) -> Result<H::Key, HeapError> {
        let key = self.inner.extract_min()?;
        self.emit(Operation::ExtractMin);
        Ok(key)
    }

    pub fn merge(&mut self, other: H) {
        self.inner.merge(other);
        self.emit(Operation::Merge);
    }

    pub fn decrease_key(&mut self, node: &NodeRef, new_key: H::Key) -> Result<(), HeapError> {
        self.inner.decrease_key(node, new_key)?;
        self.emit(Operation::DecreaseKey);
        Ok(())
    }

    pub fn find_min(&self) -> Result<&H::Key, HeapError> {
        self.inner.find_min()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get_ref(&self) -> &H {
        &self.inner
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

/// A splay tree that reports a snapshot to `observer` after each access
///
/// `search` counts as mutating: it restructures the tree even when the key is
/// absent. `delete` of a missing key still splays, so it emits as well.
pub struct ObservedTree<K: Ord, F> {
    inner: SplayTree<K>,
    observer: F,
}

impl<K, F> ObservedTree<K, F>
where
    K: Ord + Clone,
    F: FnMut(Operation, &Snapshot<K>),
{
    pub fn new(inner: SplayTree<K>, observer: F) -> Self {
        ObservedTree { inner, observer }
    }

    fn emit(&mut self, operation: Operation) {
        let snapshot = self.inner.snapshot();
        (self.observer)(operation, &snapshot);
    }

    pub fn insert(&mut self, key: K) -> bool {
        let inserted = self.inner.insert(key);
        self.emit(Operation::Insert);
        inserted
    }

    pub fn search(&mut self, key: &K) -> bool {
        let found = self.inner.search(key);
        self.emit(Operation::Search);
        found
    }

    pub fn delete(&mut self, key: &K) -> bool {
        let removed = self.inner.delete(key);
        self.emit(Operation::Delete);
        removed
    }

    pub fn get_ref(&self) -> &SplayTree<K> {
        &self.inner
    }

    pub fn into_inner(self) -> SplayTree<K> {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NodeStore, StoredNode};

    struct Dummy(NodeId);

    impl StoredNode for Dummy {
        fn id(&self) -> NodeId {
            self.0
        }
    }

    fn ids(n: usize) -> Vec<NodeId> {
        let mut store: NodeStore<Dummy> = NodeStore::new();
        (0..n)
            .map(|_| {
                let key = store.insert_with(Dummy);
                store.id(key)
            })
            .collect()
    }

    fn chain(keys: &[i32]) -> Snapshot<i32> {
        let ids = ids(keys.len());
        let nodes = keys
            .iter()
            .enumerate()
            .map(|(i, &key)| {
                let mut node = NodeSnapshot::new(ids[i], key, i.checked_sub(1).map(|p| ids[p]));
                node.children = ids.get(i + 1).copied().into_iter().collect();
                node
            })
            .collect();
        Snapshot {
            nodes,
            roots: ids.first().copied().into_iter().collect(),
            min: ids.first().copied(),
            size: keys.len(),
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let snap: Snapshot<i32> = Snapshot::empty();
        assert!(snap.is_well_formed());
        assert!(snap.is_heap_ordered());
        assert!(snap.is_search_ordered());
    }

    #[test]
    fn test_heap_order_detection() {
        assert!(chain(&[1, 2, 2, 5]).is_heap_ordered());
        assert!(!chain(&[1, 3, 2]).is_heap_ordered());
    }

    #[test]
    fn test_well_formed_detects_size_mismatch() {
        let mut snap = chain(&[1, 2, 3]);
        assert!(snap.is_well_formed());
        snap.size = 4;
        assert!(!snap.is_well_formed());
    }

    #[test]
    fn test_search_order_detection() {
        let ids = ids(3);
        let build = |left_key: i32, right_key: i32| Snapshot {
            nodes: vec![
                NodeSnapshot::new(ids[0], 10, None).with_slots(Some(ids[1]), Some(ids[2])),
                NodeSnapshot::new(ids[1], left_key, Some(ids[0])),
                NodeSnapshot::new(ids[2], right_key, Some(ids[0])),
            ],
            roots: vec![ids[0]],
            min: Some(ids[1]),
            size: 3,
        };
        assert!(build(5, 15).is_search_ordered());
        assert!(!build(12, 15).is_search_ordered());
        assert!(!build(5, 10).is_search_ordered());
    }

    #[test]
    fn test_snapshot_lookup() {
        let snap = chain(&[4, 8]);
        let second = snap.nodes[1].id;
        assert_eq!(snap.node(second).map(|n| n.key), Some(8));
        assert_eq!(snap.keys().copied().collect::<Vec<_>>(), vec![4, 8]);
    }
}
