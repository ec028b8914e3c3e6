//! Skew Heap implementation
//!
//! A skew heap is a self-adjusting binary heap with:
//! - O(log n) amortized insert, merge and extract_min
//! - O(log n) amortized decrease_key (cut and re-meld)
//!
//! Every meld walks the right spines of both operands and swaps the
//! children of each node it passes through, unconditionally. No balance
//! information is stored; the swap rule alone keeps the amortized right
//! spine logarithmic.
//!
//! The meld is iterative, so even a degenerate (path-shaped) heap never
//! recurses deeply.

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
    left: Option<NodeKey>,
    right: Option<NodeKey>,
}

impl<K> StoredNode for Node<K> {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// Skew Heap
///
/// # Example
///
/// ```rust
/// use meldable_heaps::skew::SkewHeap;
/// use meldable_heaps::MeldableHeap;
///
/// let mut a: SkewHeap<i32> = [4, 2, 3].into_iter().collect();
/// let b: SkewHeap<i32> = [1, 8].into_iter().collect();
/// a.merge(b);
/// assert_eq!(a.len(), 5);
/// assert_eq!(a.into_sorted_vec(), vec![1, 2, 3, 4, 8]);
/// ```
#[derive(Debug)]
pub struct SkewHeap<K: Ord> {
    store: NodeStore<Node<K>>,
    root: Option<NodeKey>,
}

impl<K: Ord> MeldableHeap<K> for SkewHeap<K> {
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
        trace!("skew: extracted {}", node.id);
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

        let SkewHeap { store, root } = other;
        self.store.append(store);
        self.root = self.meld(self.root, root);
        debug!("skew: merged, {} nodes", self.len());
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
        if self.root == Some(node) {
            return Ok(());
        }

        self.cut(node);
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

impl<K: Ord> SkewHeap<K> {
    /// Melds two detached trees, returning the new root
    ///
    /// Top-down form of the recursive rule `merge(a, b) = a with
    /// left := merge(a.right, b), right := a.left` where `a` has the smaller
    /// root key. Ties keep the left operand on top.
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
        loop {
            let node = &mut self.store[a];
            let old_right = node.right.take();
            node.right = node.left.take();
            trace!("skew: swapped children of {}", node.id);

            match old_right {
                None => {
                    self.attach_left(a, b);
                    break;
                }
                Some(right) => {
                    let (next, other) = if self.store[b].key < self.store[right].key {
                        (b, right)
                    } else {
                        (right, b)
                    };
                    self.attach_left(a, next);
                    a = next;
                    b = other;
                }
            }
        }
        Some(root)
    }

    fn attach_left(&mut self, parent: NodeKey, child: NodeKey) {
        self.store[parent].left = Some(child);
        self.store[child].parent = Some(parent);
    }

    /// Detaches the subtree rooted at `node` from its parent
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
        trace!("skew: cut {} from {}", self.store.id(node), self.store.id(parent));
    }

    fn children(&self, node: NodeKey) -> SmallVec<[NodeKey; 4]> {
        let node = &self.store[node];
        [node.left, node.right].into_iter().flatten().collect()
    }
}

impl<K: Ord + Clone> Inspect for SkewHeap<K> {
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
                NodeSnapshot::new(node.id, node.key.clone(), node.parent.map(|p| store.id(p)))
                    .with_slots(node.left.map(|l| store.id(l)), node.right.map(|r| store.id(r)))
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

impl<K: Ord> Default for SkewHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> Extend<K> for SkewHeap<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord> FromIterator<K> for SkewHeap<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut heap = Self::new();
        heap.extend(iter);
        heap
    }
}
