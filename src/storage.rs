//! Arena storage for heap and tree nodes
//!
//! Every structure in this crate keeps its nodes in a [`NodeStore`]: a set of
//! `slotmap` arenas ("segments") addressed by [`NodeKey`]. A key names the
//! segment a node was allocated in plus its slot there, so it never changes
//! while the node is alive.
//!
//! # Design
//!
//! Structural links (parent, children, siblings, left/right) are stored as
//! `NodeKey`s inside the nodes. Ownership is purely by arena membership, so a
//! parent link is never an ownership edge and relinking a subtree is a matter
//! of overwriting a few keys.
//!
//! Each store allocates into its own home segment. [`NodeStore::append`]
//! takes over another store's segments wholesale: no node is moved or
//! relinked, so a merge costs O(1) per segment instead of O(1) per node, and
//! every outstanding [`NodeRef`] stays valid. Segments are dropped as soon as
//! their last node is removed.

use crate::traits::NodeRef;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU64, Ordering};

new_key_type! {
    /// Slot of a node within one segment
    struct SlotKey;
}

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);
static NEXT_SEGMENT: AtomicU64 = AtomicU64::new(0);

/// Stable identity of a node
///
/// Ids are unique across every structure in the process and never change
/// while the node is alive, including across merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric id
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Process-unique segment number; never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SegmentId(u64);

impl SegmentId {
    fn next() -> Self {
        SegmentId(NEXT_SEGMENT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Location of a node: its segment and its slot there
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeKey {
    segment: SegmentId,
    slot: SlotKey,
}

/// A node record that can live in a [`NodeStore`]
pub(crate) trait StoredNode {
    /// The node's stable id
    fn id(&self) -> NodeId;
}

/// Segmented arena of nodes
#[derive(Debug)]
pub(crate) struct NodeStore<N> {
    home: SegmentId,
    nodes: SlotMap<SlotKey, N>,
    /// Non-empty segments taken over from other stores
    absorbed: FxHashMap<SegmentId, SlotMap<SlotKey, N>>,
    len: usize,
}

impl<N> Default for NodeStore<N> {
    fn default() -> Self {
        Self {
            home: SegmentId::next(),
            nodes: SlotMap::with_key(),
            absorbed: FxHashMap::default(),
            len: 0,
        }
    }
}

impl<N: StoredNode> NodeStore<N> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Allocates a node under a freshly minted id
    pub(crate) fn insert_with(&mut self, make: impl FnOnce(NodeId) -> N) -> NodeKey {
        self.insert_with_key(|id, _| make(id))
    }

    /// Like [`insert_with`](Self::insert_with), also passing the node its own key
    pub(crate) fn insert_with_key(&mut self, make: impl FnOnce(NodeId, NodeKey) -> N) -> NodeKey {
        let id = NodeId::next();
        let segment = self.home;
        let slot = self
            .nodes
            .insert_with_key(|slot| make(id, NodeKey { segment, slot }));
        self.len += 1;
        NodeKey { segment, slot }
    }

    /// Frees a node, returning its record
    ///
    /// # Panics
    /// If `key` is not live in this store.
    pub(crate) fn remove(&mut self, key: NodeKey) -> N {
        let removed = if key.segment == self.home {
            self.nodes.remove(key.slot)
        } else {
            let segment = self.absorbed.get_mut(&key.segment);
            let removed = segment.and_then(|nodes| nodes.remove(key.slot));
            if self.absorbed.get(&key.segment).is_some_and(|nodes| nodes.is_empty()) {
                self.absorbed.remove(&key.segment);
            }
            removed
        };
        let node = removed.unwrap_or_else(|| panic!("node store: removing dangling key {:?}", key));
        self.len -= 1;
        node
    }

    /// The node at `key`, if it is live in this store
    pub(crate) fn get(&self, key: NodeKey) -> Option<&N> {
        if key.segment == self.home {
            self.nodes.get(key.slot)
        } else {
            self.absorbed.get(&key.segment)?.get(key.slot)
        }
    }

    /// Resolves a caller's handle to the node's key, if the node lives here
    pub(crate) fn resolve(&self, node: &NodeRef) -> Option<NodeKey> {
        let key = node.key();
        self.get(key)
            .filter(|stored| stored.id() == node.id())
            .map(|_| key)
    }

    /// Handle to the node at `key`
    pub(crate) fn handle(&self, key: NodeKey) -> NodeRef {
        NodeRef::new(self.id(key), key)
    }

    /// Stable id of the node at `key`
    pub(crate) fn id(&self, key: NodeKey) -> NodeId {
        self[key].id()
    }

    /// Takes over every segment of `other`
    ///
    /// Keys of `other`'s nodes stay valid against `self`. The cost is
    /// proportional to the smaller number of segments, never to the number of
    /// nodes.
    pub(crate) fn append(&mut self, other: NodeStore<N>) {
        let NodeStore {
            home,
            nodes,
            mut absorbed,
            len,
        } = other;
        if absorbed.len() > self.absorbed.len() {
            std::mem::swap(&mut self.absorbed, &mut absorbed);
        }
        self.absorbed.extend(absorbed);
        if !nodes.is_empty() {
            self.absorbed.insert(home, nodes);
        }
        self.len += len;
    }

    /// Number of segments currently holding this store's nodes
    #[cfg(test)]
    pub(crate) fn segments(&self) -> usize {
        1 + self.absorbed.len()
    }

    /// Pre-order walk over the trees rooted at `roots`
    ///
    /// `children` lists a node's direct children in order. The walk uses an
    /// explicit stack, so degenerate (path-shaped) trees are fine.
    pub(crate) fn preorder<F>(&self, roots: &[NodeKey], children: F) -> Vec<NodeKey>
    where
        F: Fn(NodeKey) -> SmallVec<[NodeKey; 4]>,
    {
        let mut order = Vec::with_capacity(self.len());
        let mut stack: Vec<NodeKey> = roots.iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            order.push(key);
            stack.extend(children(key).into_iter().rev());
        }
        order
    }
}

impl<N> Index<NodeKey> for NodeStore<N> {
    type Output = N;

    #[inline]
    fn index(&self, key: NodeKey) -> &N {
        if key.segment == self.home {
            &self.nodes[key.slot]
        } else {
            &self.absorbed[&key.segment][key.slot]
        }
    }
}

impl<N> IndexMut<NodeKey> for NodeStore<N> {
    #[inline]
    fn index_mut(&mut self, key: NodeKey) -> &mut N {
        if key.segment == self.home {
            &mut self.nodes[key.slot]
        } else {
            self.absorbed
                .get_mut(&key.segment)
                .and_then(|nodes| nodes.get_mut(key.slot))
                .unwrap_or_else(|| panic!("node store: dangling key {:?}", key))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Cell {
        id: NodeId,
        value: i32,
        next: Option<NodeKey>,
    }

    impl StoredNode for Cell {
        fn id(&self) -> NodeId {
            self.id
        }
    }

    fn cell(value: i32) -> impl FnOnce(NodeId) -> Cell {
        move |id| Cell {
            id,
            value,
            next: None,
        }
    }

    #[test]
    fn test_insert_resolve_remove() {
        let mut store: NodeStore<Cell> = NodeStore::new();
        let key = store.insert_with(cell(42));
        let handle = store.handle(key);

        assert_eq!(store.len(), 1);
        assert_eq!(store.resolve(&handle), Some(key));
        assert_eq!(store[key].value, 42);

        store[key].value = 100;
        assert_eq!(store.remove(key).value, 100);
        assert_eq!(store.resolve(&handle), None);
        assert!(store.get(key).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_handles_do_not_resolve_in_other_stores() {
        let mut a: NodeStore<Cell> = NodeStore::new();
        let mut b: NodeStore<Cell> = NodeStore::new();
        let ka = a.insert_with(cell(1));
        let kb = b.insert_with(cell(1));
        assert_ne!(a.id(ka), b.id(kb));
        assert_eq!(b.resolve(&a.handle(ka)), None);
        assert_eq!(a.resolve(&b.handle(kb)), None);
    }

    #[test]
    fn test_insert_with_key_sees_own_key() {
        let mut store: NodeStore<Cell> = NodeStore::new();
        let key = store.insert_with_key(|id, own| Cell {
            id,
            value: 7,
            next: Some(own),
        });
        assert_eq!(store[key].next, Some(key));
    }

    #[test]
    fn test_append_keeps_keys_and_links() {
        let mut a: NodeStore<Cell> = NodeStore::new();
        let zero = a.insert_with(cell(0));

        let mut b: NodeStore<Cell> = NodeStore::new();
        let first = b.insert_with(cell(1));
        let second = b.insert_with(cell(2));
        b[first].next = Some(second);
        let handle = b.handle(first);

        a.append(b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.segments(), 2);
        assert_eq!(a.resolve(&handle), Some(first));
        assert_eq!(a[first].next, Some(second));
        assert_eq!(a[second].value, 2);
        assert_eq!(a[zero].value, 0);

        // New nodes still go to the home segment
        let third = a.insert_with(cell(3));
        assert_eq!(a[third].value, 3);
        assert_eq!(a.segments(), 2);
    }

    #[test]
    fn test_empty_segments_are_released() {
        let mut a: NodeStore<Cell> = NodeStore::new();
        a.insert_with(cell(0));
        let mut b: NodeStore<Cell> = NodeStore::new();
        let only = b.insert_with(cell(1));
        a.append(b);
        assert_eq!(a.segments(), 2);

        assert_eq!(a.remove(only).value, 1);
        assert_eq!(a.segments(), 1);
        assert_eq!(a.len(), 1);

        // An empty store contributes no segment at all
        a.append(NodeStore::new());
        assert_eq!(a.segments(), 1);
    }

    #[test]
    fn test_append_cost_follows_segments_not_nodes() {
        let mut total: NodeStore<Cell> = NodeStore::new();
        for chunk in 0..8 {
            let mut part: NodeStore<Cell> = NodeStore::new();
            for v in 0..1_000 {
                part.insert_with(cell(chunk * 1_000 + v));
            }
            let mut other: NodeStore<Cell> = NodeStore::new();
            other.insert_with(cell(-1));
            other.append(part);
            total.append(other);
        }
        assert_eq!(total.len(), 8 * 1_001);
        assert_eq!(total.segments(), 1 + 16);
    }

    #[test]
    fn test_preorder_follows_child_order() {
        let mut store: NodeStore<Cell> = NodeStore::new();
        let keys: Vec<_> = (0..4).map(|v| store.insert_with(cell(v))).collect();
        // 0 -> [1, 2], 1 -> [3]
        let order = store.preorder(&[keys[0]], |k| {
            let mut out = SmallVec::new();
            if k == keys[0] {
                out.push(keys[1]);
                out.push(keys[2]);
            } else if k == keys[1] {
                out.push(keys[3]);
            }
            out
        });
        let values: Vec<i32> = order.iter().map(|&k| store[k].value).collect();
        assert_eq!(values, vec![0, 1, 3, 2]);
    }
}
