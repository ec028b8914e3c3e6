//! Pairing Heap implementation
//!
//! A pairing heap is a single heap-ordered multiway tree with:
//! - O(1) insert and merge
//! - O(log n) amortized extract_min
//! - o(log n) amortized decrease_key
//!
//! Children are kept as a leftmost-child / next-sibling list. `extract_min`
//! combines the orphaned children with the classic two-pass scheme: pair them
//! up left to right, then fold the pairs back together right to left.
//!
//! `decrease_key` detaches the whole subtree rooted at the node and links it
//! back against the root, so heap order holds even when the new key undercuts
//! the old parent.

use crate::snapshot::{Inspect, NodeSnapshot, Snapshot};
use crate::storage::{NodeId, NodeKey, NodeStore, StoredNode};
use crate::traits::{HeapError, MeldableHeap, NodeRef};
use log::{debug, trace};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

#[derive(Debug)]
struct Node<K> {
    id: NodeId,
    key: K,
    child: Option<NodeKey>,
    sibling: Option<NodeKey>,
    prev: Option<NodeKey>, // For decrease_key: parent or previous sibling
}

impl<K> StoredNode for Node<K> {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// Pairing Heap
///
/// # Example
///
/// ```rust
/// use meldable_heaps::pairing::PairingHeap;
/// use meldable_heaps::MeldableHeap;
///
/// let mut heap = PairingHeap::new();
/// let handle = heap.insert(5);
/// heap.insert(2);
/// heap.decrease_key(&handle, 1).unwrap();
/// assert_eq!(heap.find_min(), Ok(&1));
/// ```
#[derive(Debug)]
pub struct PairingHeap<K: Ord> {
    store: NodeStore<Node<K>>,
    root: Option<NodeKey>,
}

impl<K: Ord> MeldableHeap<K> for PairingHeap<K> {
    fn new() -> Self {
        Self {
            store: NodeStore::new(),
            root: None,
        }
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn insert(&mut self, key: K) -> NodeRef {
        let node = self.store.insert_with(|id| Node {
            id,
            key,
            child: None,
            sibling: None,
            prev: None,
        });
        self.root = Some(match self.root {
            Some(root) => self.link(root, node),
            None => node,
        });
        self.store.handle(node)
    }

    fn find_min(&self) -> Result<&K, HeapError> {
        self.root
            .map(|root| &self.store[root].key)
            .ok_or(HeapError::EmptyHeap)
    }

    fn min_node(&self) -> Option<NodeRef> {
        self.root.map(|root| self.store.handle(root))
    }

    fn extract_min(&mut self) -> Result<K, HeapError> {
        let root = self.root.ok_or(HeapError::EmptyHeap)?;
        let node = self.store.remove(root);
        self.root = node.child.map(|first| self.merge_pairs(first));
        trace!("pairing: extracted {}", node.id);
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

        let PairingHeap { store, root } = other;
        self.store.append(store);

        if let (Some(ours), Some(theirs)) = (self.root, root) {
            self.root = Some(self.link(ours, theirs));
        }
        debug!("pairing: merged, {} nodes", self.len());
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

        // If node is root, we're done
        let Some(root) = self.root.filter(|&root| root != node) else {
            return Ok(());
        };

        self.cut(node);
        self.root = Some(self.link(root, node));
        trace!("pairing: re-linked {} after decrease", self.store.id(node));
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

impl<K: Ord> PairingHeap<K> {
    /// Links two detached trees; the larger root becomes the leftmost child
    /// of the smaller one, which is returned. Ties keep `a` on top.
    fn link(&mut self, a: NodeKey, b: NodeKey) -> NodeKey {
        let (parent, child) = if self.store[b].key < self.store[a].key {
            (b, a)
        } else {
            (a, b)
        };

        let first = self.store[parent].child;
        {
            let child_node = &mut self.store[child];
            child_node.sibling = first;
            child_node.prev = Some(parent);
        }
        if let Some(first) = first {
            self.store[first].prev = Some(child);
        }
        self.store[parent].child = Some(child);
        parent
    }

    /// Merges a sibling list in two passes and returns the new tree root
    fn merge_pairs(&mut self, first: NodeKey) -> NodeKey {
        // First pass: pair adjacent trees left to right
        let mut pairs: SmallVec<[NodeKey; 16]> = SmallVec::new();
        let mut current = Some(first);

        while let Some(node) = current {
            let sibling = self.detach_from_list(node);
            match sibling {
                Some(sib) => {
                    current = self.detach_from_list(sib);
                    pairs.push(self.link(node, sib));
                }
                None => {
                    pairs.push(node);
                    current = None;
                }
            }
        }

        trace!("pairing: first pass produced {} trees", pairs.len());

        // Second pass: fold from right to left
        let mut result = pairs.pop().expect("pairing heap: sibling list is non-empty");
        while let Some(pair) = pairs.pop() {
            result = self.link(pair, result);
        }
        result
    }

    /// Clears a node's list links, returning its former next sibling
    fn detach_from_list(&mut self, node: NodeKey) -> Option<NodeKey> {
        let node = &mut self.store[node];
        node.prev = None;
        node.sibling.take()
    }

    /// Cuts the subtree rooted at `node` out of its parent's child list
    fn cut(&mut self, node: NodeKey) {
        let Some(prev) = self.store[node].prev else {
            return;
        };
        let sibling = self.store[node].sibling;

        if self.store[prev].child == Some(node) {
            // Node is first child
            self.store[prev].child = sibling;
        } else {
            self.store[prev].sibling = sibling;
        }
        if let Some(sibling) = sibling {
            self.store[sibling].prev = Some(prev);
        }

        let detached = &mut self.store[node];
        detached.sibling = None;
        detached.prev = None;
        trace!("pairing: cut {}", detached.id);
    }

    fn children(&self, node: NodeKey) -> SmallVec<[NodeKey; 4]> {
        let mut out = SmallVec::new();
        let mut current = self.store[node].child;
        while let Some(child) = current {
            out.push(child);
            current = self.store[child].sibling;
        }
        out
    }
}

impl<K: Ord + Clone> Inspect for PairingHeap<K> {
    type Key = K;

    fn snapshot(&self) -> Snapshot<K> {
        let Some(root) = self.root else {
            return Snapshot::empty();
        };
        let order = self.store.preorder(&[root], |key| self.children(key));

        // `prev` only names the parent for leftmost children, so parents
        // are recovered from the child lists instead
        let mut parents: FxHashMap<NodeKey, NodeId> = FxHashMap::default();
        let mut nodes = Vec::with_capacity(order.len());
        for key in order {
            let node = &self.store[key];
            let children = self.children(key);
            for &child in &children {
                parents.insert(child, node.id);
            }
            let mut snap = NodeSnapshot::new(node.id, node.key.clone(), parents.get(&key).copied());
            snap.children = children.iter().map(|&c| self.store.id(c)).collect();
            nodes.push(snap);
        }

        let root_id = self.store.id(root);
        Snapshot {
            nodes,
            roots: vec![root_id],
            min: Some(root_id),
            size: self.len(),
        }
    }
}

impl<K: Ord> Default for PairingHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> Extend<K> for PairingHeap<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord> FromIterator<K> for PairingHeap<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut heap = Self::new();
        heap.extend(iter);
        heap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child_keys(snap: &Snapshot<i32>, id: NodeId) -> Vec<i32> {
        let node = snap.node(id).expect("node in snapshot");
        node.children
            .iter()
            .map(|&c| snap.node(c).expect("child in snapshot").key)
            .collect()
    }

    #[test]
    fn test_basic_operations() {
        let mut heap = PairingHeap::new();
        assert!(heap.is_empty());

        heap.insert(5);
        heap.insert(3);
        heap.insert(7);

        assert_eq!(heap.find_min(), Ok(&3));
        assert_eq!(heap.extract_min(), Ok(3));
        assert_eq!(heap.find_min(), Ok(&5));
    }

    #[test]
    fn test_two_pass_shape() {
        let mut heap: PairingHeap<i32> = (0..=6).collect();
        let snap = heap.snapshot();
        assert_eq!(child_keys(&snap, snap.roots[0]), vec![6, 5, 4, 3, 2, 1]);

        assert_eq!(heap.extract_min(), Ok(0));
        // Pairs (6,5) (4,3) (2,1) give 5, 3, 1; folding right to left
        // hangs 3 and then 5 under 1
        let snap = heap.snapshot();
        let root = snap.roots[0];
        assert_eq!(snap.node(root).map(|n| n.key), Some(1));
        assert_eq!(child_keys(&snap, root), vec![5, 3, 2]);
        assert!(snap.is_well_formed());
        assert!(snap.is_heap_ordered());
    }

    #[test]
    fn test_decrease_key_below_parent() {
        let mut heap = PairingHeap::new();
        let handles: Vec<NodeRef> = [10, 20, 30, 40, 50].into_iter().map(|k| heap.insert(k)).collect();
        heap.insert(0);
        heap.extract_min().unwrap();

        // 40 sits below some other node now; drop it under everything
        heap.decrease_key(&handles[3], 5).unwrap();
        let snap = heap.snapshot();
        assert!(snap.is_heap_ordered());
        assert!(snap.is_well_formed());
        assert_eq!(heap.find_min(), Ok(&5));
        assert_eq!(heap.into_sorted_vec(), vec![5, 10, 20, 30, 50]);
    }

    #[test]
    fn test_decrease_key_equal_is_accepted() {
        let mut heap = PairingHeap::new();
        let handle = heap.insert(4);
        heap.insert(2);
        assert_eq!(heap.decrease_key(&handle, 4), Ok(()));
        assert_eq!(heap.decrease_key(&handle, 5), Err(HeapError::InvalidKey));
        assert_eq!(heap.key(&handle), Ok(&4));
    }

    #[test]
    fn test_merge() {
        let mut heap1 = PairingHeap::new();
        heap1.insert(5);
        heap1.insert(10);

        let mut heap2 = PairingHeap::new();
        let h3 = heap2.insert(3);
        heap2.insert(7);

        heap1.merge(heap2);
        assert_eq!(heap1.find_min(), Ok(&3));
        assert_eq!(heap1.min_node(), Some(h3));
        assert_eq!(heap1.len(), 4);
        assert_eq!(heap1.into_sorted_vec(), vec![3, 5, 7, 10]);
    }

    #[test]
    fn test_merge_links_roots_without_moving_nodes() {
        let mut small: PairingHeap<i32> = [40, 41].into_iter().collect();
        let mut large = PairingHeap::new();
        let handles: Vec<NodeRef> = (0..100_000).map(|k| large.insert(k + 100)).collect();
        large.extract_min().unwrap();

        small.merge(large);
        assert_eq!(small.len(), 100_001);
        assert_eq!(small.store.segments(), 2);
        assert_eq!(small.find_min(), Ok(&40));
        for handle in &handles[1..] {
            assert_eq!(small.store.resolve(handle), Some(handle.key()));
        }

        // The merged tree has a single root
        let snap = small.snapshot();
        assert_eq!(snap.roots.len(), 1);
        assert_eq!(snap.node(snap.roots[0]).map(|n| n.key), Some(40));

        small.decrease_key(&handles[99_999], 0).unwrap();
        assert_eq!(small.extract_min(), Ok(0));
        assert_eq!(small.extract_min(), Ok(40));
        assert_eq!(small.extract_min(), Ok(41));
        assert_eq!(small.extract_min(), Ok(101));
    }
}
