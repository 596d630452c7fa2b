use crate::{Key, Result, Sum, TreeError, EMPTY};
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Node colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Color {
    /// Red.
    Red,
    /// Black.
    Black,
}

/// Node record. Links are keys of other nodes, [`EMPTY`] means none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    /// Key, which is also the identity of the node.
    pub key: Key,
    /// Parent key.
    pub parent: Key,
    /// Left child key.
    pub left: Key,
    /// Right child key.
    pub right: Key,
    /// Colour.
    pub color: Color,
    /// Sum of all keys in the subtree rooted here.
    pub sum: Sum,
    /// Set when the node was discarded by [`crate::RbTree::remove_left`].
    pub tombstoned: bool,
}

impl Node {
    /// The immutable record stored at key 0.
    pub const SENTINEL: Node = Node {
        key: EMPTY,
        parent: EMPTY,
        left: EMPTY,
        right: EMPTY,
        color: Color::Black,
        sum: 0,
        tombstoned: false,
    };

    /// New red leaf.
    pub(crate) fn leaf(key: Key, parent: Key) -> Self {
        Self {
            key,
            parent,
            left: EMPTY,
            right: EMPTY,
            color: Color::Red,
            sum: Sum::from(key),
            tombstoned: false,
        }
    }

    /// Record left behind by a single remove.
    pub(crate) fn detached(key: Key) -> Self {
        Self {
            key,
            ..Self::SENTINEL
        }
    }

    /// Is the node red?
    #[must_use]
    pub fn is_red(&self) -> bool {
        self.color == Color::Red
    }
}

/// Flat map from key to node record.
///
/// Records are never erased, key 0 always reads as [`Node::SENTINEL`] and cannot be written.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeStore {
    nodes: HashMap<Key, Node>,
}

impl NodeStore {
    /// Returns a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for key, the sentinel for key 0.
    pub fn get(&self, key: Key) -> Result<&Node> {
        if key == EMPTY {
            return Ok(&Node::SENTINEL);
        }
        self.nodes.get(&key).ok_or(TreeError::NotFound(key))
    }

    /// Has a record ever been created for key?
    #[must_use]
    pub fn exists(&self, key: Key) -> bool {
        key != EMPTY && self.nodes.contains_key(&key)
    }

    /// Store a record, replacing any previous one.
    pub fn put(&mut self, key: Key, node: Node) -> Result<()> {
        if key == EMPTY {
            return Err(TreeError::InvariantViolation(
                "sentinel record is immutable".to_string(),
            ));
        }
        self.nodes.insert(key, node);
        Ok(())
    }

    /// Number of records, including detached and tombstoned ones.
    #[must_use]
    pub fn records(&self) -> usize {
        self.nodes.len()
    }

    /// Store a record for a key the caller knows is nonzero.
    #[inline]
    pub(crate) fn put_fresh(&mut self, key: Key, node: Node) {
        debug_assert!(key != EMPTY);
        self.nodes.insert(key, node);
    }

    // Internal accessors. The algorithms only follow links of committed records,
    // so a missing record here is a broken invariant.

    #[inline]
    pub(crate) fn node(&self, key: Key) -> &Node {
        if key == EMPTY {
            &Node::SENTINEL
        } else {
            &self.nodes[&key]
        }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, key: Key) -> Option<&mut Node> {
        if key == EMPTY {
            None
        } else {
            self.nodes.get_mut(&key)
        }
    }

    #[inline]
    pub(crate) fn left(&self, key: Key) -> Key {
        self.node(key).left
    }

    #[inline]
    pub(crate) fn right(&self, key: Key) -> Key {
        self.node(key).right
    }

    #[inline]
    pub(crate) fn parent(&self, key: Key) -> Key {
        self.node(key).parent
    }

    #[inline]
    pub(crate) fn sum(&self, key: Key) -> Sum {
        self.node(key).sum
    }

    #[inline]
    pub(crate) fn color(&self, key: Key) -> Color {
        self.node(key).color
    }

    #[inline]
    pub(crate) fn is_red(&self, key: Key) -> bool {
        self.node(key).is_red()
    }

    #[inline]
    pub(crate) fn set_left(&mut self, key: Key, left: Key) {
        if let Some(n) = self.node_mut(key) {
            n.left = left;
        }
    }

    #[inline]
    pub(crate) fn set_right(&mut self, key: Key, right: Key) {
        if let Some(n) = self.node_mut(key) {
            n.right = right;
        }
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, key: Key, parent: Key) {
        if let Some(n) = self.node_mut(key) {
            n.parent = parent;
        }
    }

    #[inline]
    pub(crate) fn set_color(&mut self, key: Key, color: Color) {
        if let Some(n) = self.node_mut(key) {
            n.color = color;
        }
    }

    /// Recompute the sum of key from its (up to date) children.
    #[inline]
    pub(crate) fn pull_sum(&mut self, key: Key) {
        if key == EMPTY {
            return;
        }
        let n = self.node(key);
        let sum = Sum::from(key) + self.sum(n.left) + self.sum(n.right);
        if let Some(n) = self.node_mut(key) {
            n.sum = sum;
        }
    }

    pub(crate) fn set_tombstoned(&mut self, key: Key) {
        if let Some(n) = self.node_mut(key) {
            n.tombstoned = true;
        }
    }
}
