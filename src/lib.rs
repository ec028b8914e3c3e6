//! Self-adjusting meldable heaps and a splay tree
//!
//! This crate provides priority queues with efficient `merge` and
//! `decrease_key`, sharing one contract ([`MeldableHeap`]), plus a
//! self-adjusting binary search tree. Every structure can describe itself as
//! a detached [`Snapshot`] for rendering or inspection.
//!
//! # Features
//!
//! - **Fibonacci Heap**: O(1) merge; O(1) amortized insert and decrease_key; O(log n) amortized extract_min
//! - **Pairing Heap**: O(1) insert and merge; O(log n) amortized extract_min; o(log n) amortized decrease_key
//! - **Skew Heap**: O(log n) amortized insert, merge, extract_min and decrease_key
//! - **Leftist Heap**: O(log n) worst-case insert, merge and extract_min
//! - **Splay Tree**: O(log n) amortized insert, search and delete with move-to-root
//!
//! Merging never copies nodes: the surviving heap takes over the consumed
//! heap's arena segments whole, so every [`NodeRef`] and [`NodeId`] stays
//! valid across merges.
//!
//! # Example
//!
//! ```rust
//! use meldable_heaps::fibonacci::FibonacciHeap;
//! use meldable_heaps::{Inspect, MeldableHeap};
//!
//! let mut heap = FibonacciHeap::new();
//! let five = heap.insert(5);
//! heap.insert(3);
//! heap.decrease_key(&five, 1).unwrap();
//! assert_eq!(heap.find_min(), Ok(&1));
//!
//! let snapshot = heap.snapshot();
//! assert!(snapshot.is_heap_ordered());
//! assert_eq!(snapshot.size, 2);
//! ```
//!
//! # Logging
//!
//! Structural steps (links, cuts, rotations, rank swaps) are reported through
//! the [`log`] facade at `trace` level, whole operations at `debug` level.
//! The crate never installs a logger itself.

pub mod fibonacci;
pub mod leftist;
pub mod pairing;
pub mod skew;
pub mod snapshot;
pub mod splay;
pub mod storage;
pub mod traits;

// Re-export the main types for convenience
pub use snapshot::{Inspect, Snapshot};
pub use splay::SplayTree;
pub use storage::NodeId;
pub use traits::{HeapError, MeldableHeap, NodeRef};
