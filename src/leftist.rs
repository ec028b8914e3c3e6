//! Leftist Heap implementation
//!
//! A leftist heap is a heap-ordered binary tree where every node's left
//! child has rank at least that of its right child. The rank of a node is
//! the length of its right spine (an empty tree has rank 0, a leaf rank 1),
//! so the right spine of an n-node heap has at most ⌊log₂(n + 1)⌋ nodes.
//!
//! - O(log n) worst case insert, merge and extract_min
//! - O(log n) decrease_key: the subtree is cut out, ranks are repaired on the
//!   path above the cut, and the subtree is merged back in
//!
//! Merging walks down both right spines, recording the path, then repairs
//! ranks bottom-up along it, swapping children wherever the leftist property
//! would be violated.

use crate::snapshot::{Inspect, NodeSnapshot, Snapshot};
use crate::storage::{NodeId, NodeKey, NodeStore, StoredNode};
use crate::traits::{HeapError, MeldableHeap, NodeRef};
use log::{debug, trace};
use smallvec::SmallVec;

#[derive(Debug)]
struct Node<K> {
    id: NodeId,
    key: K,
    rank: usize,
    parent: Option<NodeKey>,
    left: Option<NodeKey>,
    right: Option<NodeKey>,
}

impl<K> StoredNode for Node<K> {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// Leftist Heap
///
/// # Example
///
/// ```rust
/// use meldable_heaps::leftist::LeftistHeap;
/// use meldable_heaps::MeldableHeap;
///
/// let mut heap = LeftistHeap::new();
/// let seven = heap.insert(7);
/// heap.insert(3);
/// heap.decrease_key(&seven, 1).unwrap();
/// assert_eq!(heap.extract_min(), Ok(1));
/// assert_eq!(heap.extract_min(), Ok(3));
/// ```
#[derive(Debug)]
pub struct LeftistHeap<K: Ord> {
    store: NodeStore<Node<K>>,
    root: Option<NodeKey>,
}

impl<K: Ord> MeldableHeap<K> for LeftistHeap<K> {
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
            rank: 1,
            parent: None,
            left: None,
            right: None,
        });
        self.root = self.meld(self.root, Some(node));
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
        for child in [node.left, node.right].into_iter().flatten() {
            self.store[child].parent = None;
        }
        self.root = self.meld(node.left, node.right);
        trace!("leftist: extracted {}", node.id);
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

        let LeftistHeap { store, root } = other;
        self.store.append(store);
        self.root = self.meld(self.root, root);
        debug!("leftist: merged, {} nodes", self.len());
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
        let Some(parent) = self.store[node].parent else {
            return Ok(());
        };
        if self.store[parent].key <= self.store[node].key {
            return Ok(());
        }

        self.cut(node);
        self.repair_upward(parent);
        self.root = self.meld(self.root, Some(node));
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

impl<K: Ord> LeftistHeap<K> {
    fn rank(&self, node: Option<NodeKey>) -> usize {
        node.map_or(0, |n| self.store[n].rank)
    }

    /// Merges two detached trees along their right spines
    fn meld(&mut self, a: Option<NodeKey>, b: Option<NodeKey>) -> Option<NodeKey> {
        let (mut a, mut b) = match (a, b) {
            (None, rest) | (rest, None) => return rest,
            (Some(a), Some(b)) => (a, b),
        };
        if self.store[b].key < self.store[a].key {
            std::mem::swap(&mut a, &mut b);
        }

        let root = a;
        self.store[root].parent = None;
        let mut spine: SmallVec<[NodeKey; 32]> = SmallVec::new();
        loop {
            spine.push(a);
            match self.store[a].right {
                None => {
                    self.attach_right(a, b);
                    break;
                }
                Some(right) if self.store[b].key < self.store[right].key => {
                    // `b` takes the right slot; the old right subtree is
                    // what remains to be merged below it
                    self.attach_right(a, b);
                    a = b;
                    b = right;
                }
                Some(right) => a = right,
            }
        }

        trace!("leftist: merge path of {} nodes", spine.len());
        for &node in spine.iter().rev() {
            self.fix_rank(node);
        }
        Some(root)
    }

    fn attach_right(&mut self, parent: NodeKey, child: NodeKey) {
        self.store[parent].right = Some(child);
        self.store[child].parent = Some(parent);
    }

    /// Restores the leftist property at `node` from its children's ranks.
    /// Returns true if the node's rank changed.
    fn fix_rank(&mut self, node: NodeKey) -> bool {
        let left = self.rank(self.store[node].left);
        let right = self.rank(self.store[node].right);
        let entry = &mut self.store[node];
        if left < right {
            std::mem::swap(&mut entry.left, &mut entry.right);
            trace!("leftist: swapped children of {}", entry.id);
        }
        let rank = left.min(right) + 1;
        let changed = entry.rank != rank;
        entry.rank = rank;
        changed
    }

    /// Re-establishes ranks from `node` up towards the root, stopping at the
    /// first ancestor whose rank is unaffected
    fn repair_upward(&mut self, node: NodeKey) {
        let mut current = Some(node);
        while let Some(node) = current {
            if !self.fix_rank(node) {
                break;
            }
            current = self.store[node].parent;
        }
    }

    fn cut(&mut self, node: NodeKey) {
        let Some(parent) = self.store[node].parent.take() else {
            return;
        };
        let parent_node = &mut self.store[parent];
        if parent_node.left == Some(node) {
            parent_node.left = None;
        } else {
            debug_assert_eq!(parent_node.right, Some(node));
            parent_node.right = None;
        }
    }

    fn children(&self, node: NodeKey) -> SmallVec<[NodeKey; 4]> {
        let node = &self.store[node];
        [node.left, node.right].into_iter().flatten().collect()
    }
}

impl<K: Ord + Clone> Inspect for LeftistHeap<K> {
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
                let mut snap =
                    NodeSnapshot::new(node.id, node.key.clone(), node.parent.map(|p| store.id(p)))
                        .with_slots(node.left.map(|l| store.id(l)), node.right.map(|r| store.id(r)));
                snap.rank = Some(node.rank);
                snap
            })
            .collect();
        let root_id = store.id(root);
        Snapshot {
            nodes,
            roots: vec![root_id],
            min: Some(root_id),
            size: self.len(),
        }
    }
}

impl<K: Ord> Default for LeftistHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> Extend<K> for LeftistHeap<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord> FromIterator<K> for LeftistHeap<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut heap = Self::new();
        heap.extend(iter);
        heap
    }
}
