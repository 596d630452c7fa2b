//! Ordered navigation over the live keys of an [`RbTree`].

use crate::{Key, Node, RbTree, Result, EMPTY};
use std::{fmt, iter::FusedIterator};

impl RbTree {
    /// Root key, 0 if the tree is empty.
    #[must_use]
    pub fn root(&self) -> Key {
        self.root
    }

    /// Is key currently in the tree?
    ///
    /// Removed and tombstoned keys keep their records but are not live.
    #[must_use]
    pub fn exists(&self, key: Key) -> bool {
        match self.store.get(key) {
            Ok(n) if key != EMPTY => {
                !n.tombstoned && (n.parent != EMPTY || self.root == key)
            }
            _ => false,
        }
    }

    /// Get the node record for key. Key 0 gives [`Node::SENTINEL`].
    pub fn get_node(&self, key: Key) -> Result<Node> {
        self.store.get(key).copied()
    }

    /// Smallest key, 0 if empty.
    #[must_use]
    pub fn first(&self) -> Key {
        if self.root == EMPTY {
            EMPTY
        } else {
            self.min_from(self.root)
        }
    }

    /// Largest key, 0 if empty.
    #[must_use]
    pub fn last(&self) -> Key {
        if self.root == EMPTY {
            EMPTY
        } else {
            self.max_from(self.root)
        }
    }

    /// Next key after key, 0 at the end or if key is not in the tree.
    #[must_use]
    pub fn next(&self, key: Key) -> Key {
        if !self.exists(key) {
            return EMPTY;
        }
        let right = self.store.right(key);
        if right != EMPTY {
            return self.min_from(right);
        }
        let (mut x, mut p) = (key, self.store.parent(key));
        while p != EMPTY && x == self.store.right(p) {
            x = p;
            p = self.store.parent(p);
        }
        p
    }

    /// Key before key, 0 at the start or if key is not in the tree.
    #[must_use]
    pub fn prev(&self, key: Key) -> Key {
        if !self.exists(key) {
            return EMPTY;
        }
        let left = self.store.left(key);
        if left != EMPTY {
            return self.max_from(left);
        }
        let (mut x, mut p) = (key, self.store.parent(key));
        while p != EMPTY && x == self.store.left(p) {
            x = p;
            p = self.store.parent(p);
        }
        p
    }

    /// Iterate over the keys in ascending order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            tree: self,
            front: self.first(),
            back: self.last(),
            len: self.len,
        }
    }

    fn min_from(&self, mut key: Key) -> Key {
        while self.store.left(key) != EMPTY {
            key = self.store.left(key);
        }
        key
    }

    fn max_from(&self, mut key: Key) -> Key {
        while self.store.right(key) != EMPTY {
            key = self.store.right(key);
        }
        key
    }
}

/// Iterator returned by [`RbTree::iter`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    tree: &'a RbTree,
    front: Key,
    back: Key,
    len: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Key;
    fn next(&mut self) -> Option<Key> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let key = self.front;
        self.front = self.tree.next(key);
        Some(key)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}
impl<'a> ExactSizeIterator for Iter<'a> {
    fn len(&self) -> usize {
        self.len
    }
}
impl<'a> DoubleEndedIterator for Iter<'a> {
    fn next_back(&mut self) -> Option<Key> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let key = self.back;
        self.back = self.tree.prev(key);
        Some(key)
    }
}
impl<'a> FusedIterator for Iter<'a> {}

impl<'a> IntoIterator for &'a RbTree {
    type Item = Key;
    type IntoIter = Iter<'a>;
    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl fmt::Debug for RbTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
