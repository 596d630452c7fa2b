#![deny(missing_docs)]

//! This crate implements [RbTree], a red-black tree of `u64` keys with subtree sums and
//! atomic prefix truncation.
//!
//! Nodes are not linked by pointers, every node is stored in a [NodeStore] under its own
//! key and refers to its parent and children by key. Key 0 ([EMPTY]) is reserved as the
//! "no node" sentinel.
//!
//! Besides insert, remove and ordered navigation, the tree supports
//! [RbTree::remove_left], which removes every key up to and including a given key in
//! O(log n) by splitting the tree along one search path and joining the surviving pieces.
//! Nodes discarded this way are tombstoned: their records stay addressable with the
//! fields they had when they were cut off, see [RbTree::subtree_removed] and [RbTree::sums].
//!
//! Most of the implementation is in the [tree] module, see [RbTree].
//!
//! # Example
//!
//! ```
//!     use rbtree_sums::RbTree;
//!     let mut t = RbTree::new();
//!     for k in [1, 2, 3, 8, 5, 4, 7, 6] {
//!         t.insert(k).unwrap();
//!     }
//!     assert_eq!(t.prefix_sum(4), 10);
//!     t.remove_left(4).unwrap();
//!     assert_eq!(t.iter().collect::<Vec<_>>(), [5, 6, 7, 8]);
//!     assert!(t.subtree_removed(3).unwrap());
//!     assert_eq!(t.total(), 26);
//! ```
//!
//!# Features
//!
//! This crate supports the following cargo features:
//! - `serde` : enables serialisation of [RbTree] and its node records via serde crate.

/// Module with the tree type, single insert and remove.
pub mod tree;

/// Module with [Node], [Color] and [NodeStore].
pub mod store;

pub mod iter;

mod bulk;
mod error;

pub use error::{Result, TreeError};
pub use iter::Iter;
pub use store::{Color, Node, NodeStore};
pub use tree::RbTree;

/// Key type. Keys are the identity of nodes.
pub type Key = u64;

/// Aggregate type, wide enough that sums of `u64` keys cannot overflow in practice.
pub type Sum = u128;

/// The reserved sentinel key meaning "no node".
pub const EMPTY: Key = 0;

// Tests.

/* mimalloc cannot be used with miri */
#[cfg(all(test, not(miri)))]
use mimalloc::MiMalloc;

#[cfg(all(test, not(miri)))]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
