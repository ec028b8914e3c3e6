//! Common traits for meldable heap data structures
//!
//! Every heap variant in this crate implements [`MeldableHeap`]: the shared
//! `insert` / `find_min` / `extract_min` / `merge` / `decrease_key` contract.
//! The variant is chosen by picking the concrete type at construction time,
//! so generic code can be written once against the trait.
//!
//! Elements are addressed through [`NodeRef`] handles returned by `insert`.
//! A handle names one node by its stable [`NodeId`]; it is only meaningful
//! for the heap that currently holds that node.

use crate::storage::{NodeId, NodeKey};
use thiserror::Error;

/// Error type for heap operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
    /// `find_min` or `extract_min` on a heap with no elements
    #[error("heap is empty")]
    EmptyHeap,
    /// `decrease_key` was given a key greater than the node's current key
    #[error("new key is greater than the current key")]
    InvalidKey,
    /// The node reference is not live in this heap (never inserted here, or already extracted)
    #[error("node does not belong to this heap")]
    NodeNotOwned,
}

/// A handle to an element in a heap, used for `decrease_key` and `key` lookups
///
/// Handles are plain values: copying one does not keep the node alive, and a
/// handle to an extracted node is simply rejected with
/// [`HeapError::NodeNotOwned`]. Handles survive [`MeldableHeap::merge`]: a node
/// taken over from the consumed heap keeps its id and its arena location, and
/// stays addressable through the surviving heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    id: NodeId,
    key: NodeKey,
}

impl NodeRef {
    pub(crate) fn new(id: NodeId, key: NodeKey) -> Self {
        NodeRef { id, key }
    }

    pub(crate) fn key(&self) -> NodeKey {
        self.key
    }

    /// The stable identity of the referenced node, as it appears in snapshots
    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// Shared contract of every meldable heap variant
///
/// # Example
///
/// ```rust
/// use meldable_heaps::{MeldableHeap, HeapError};
/// use meldable_heaps::fibonacci::FibonacciHeap;
///
/// let mut heap = FibonacciHeap::new();
/// let node = heap.insert(10);
/// heap.insert(4);
/// heap.decrease_key(&node, 1).unwrap();
/// assert_eq!(heap.find_min(), Ok(&1));
/// assert_eq!(heap.decrease_key(&node, 7), Err(HeapError::InvalidKey));
/// ```
pub trait MeldableHeap<K: Ord>: Sized {
    /// Creates a new empty heap
    fn new() -> Self;

    /// Returns true if the heap is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of live nodes in the heap
    fn len(&self) -> usize;

    /// Inserts a key, returning a handle usable by `decrease_key`
    ///
    /// # Time Complexity
    /// O(1) amortized for Fibonacci and pairing heaps, O(log n) amortized for
    /// skew heaps, O(log n) worst case for leftist heaps.
    fn insert(&mut self, key: K) -> NodeRef;

    /// Returns the minimum key
    ///
    /// # Errors
    /// [`HeapError::EmptyHeap`] if the heap has no elements.
    fn find_min(&self) -> Result<&K, HeapError>;

    /// Returns a handle to the node holding the minimum key
    fn min_node(&self) -> Option<NodeRef>;

    /// Removes and returns the minimum key
    ///
    /// # Errors
    /// [`HeapError::EmptyHeap`] if the heap has no elements.
    fn extract_min(&mut self) -> Result<K, HeapError>;

    /// Merges another heap of the same variant into this one, consuming it
    ///
    /// No node is copied: O(1) for Fibonacci and pairing heaps (plus a
    /// constant per arena segment of the smaller side), O(log n) for skew and
    /// leftist heaps.
    ///
    /// Handles to nodes of `other` remain valid against `self` afterwards.
    fn merge(&mut self, other: Self);

    /// Lowers the key of the referenced node
    ///
    /// A `new_key` equal to the current key is accepted.
    ///
    /// # Errors
    /// - [`HeapError::NodeNotOwned`] if `node` is not live in this heap
    /// - [`HeapError::InvalidKey`] if `new_key` is greater than the current key
    ///
    /// Both checks run before anything is modified.
    fn decrease_key(&mut self, node: &NodeRef, new_key: K) -> Result<(), HeapError>;

    /// Returns true if the referenced node is live in this heap
    fn contains(&self, node: &NodeRef) -> bool;

    /// Returns the current key of the referenced node
    fn key(&self, node: &NodeRef) -> Result<&K, HeapError>;

    /// Drains the heap into a vector in non-decreasing key order
    fn into_sorted_vec(mut self) -> Vec<K> {
        let mut sorted = Vec::with_capacity(self.len());
        while let Ok(key) = self.extract_min() {
            sorted.push(key);
        }
        sorted
    }
}
