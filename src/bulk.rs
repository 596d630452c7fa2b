//! Batch insert, prefix truncation (split/join), tombstones and aggregate queries.

use crate::{Color, Key, Node, RbTree, Result, Sum, TreeError, EMPTY};
use log::debug;
use std::collections::HashSet;

// Search path stack. A red-black tree over 64-bit keys is at most 128 levels deep.
type StkVec<T> = arrayvec::ArrayVec<T, 128>;

/// A retained piece of the tree found while splitting: pivot key and its right subtree,
/// with the black-height of that subtree.
struct Pivot {
    key: Key,
    right: Key,
    right_bh: u32,
}

impl RbTree {
    /// Insert a batch of keys.
    ///
    /// The result is the same as inserting each key in turn, except that the batch is
    /// validated first: the first zero key gives [`TreeError::EmptyKey`], the first key
    /// already present (or repeated within the batch) gives [`TreeError::AlreadyExists`],
    /// and on error nothing is inserted.
    pub fn insert_bulk(&mut self, keys: &[Key]) -> Result<()> {
        let mut seen = HashSet::with_capacity(keys.len());
        for &key in keys {
            if key == EMPTY {
                return Err(TreeError::EmptyKey);
            }
            if !seen.insert(key) || self.exists(key) {
                return Err(TreeError::AlreadyExists(key));
            }
        }
        if self.root == EMPTY && keys.len() > 1 {
            let mut sorted = keys.to_vec();
            sorted.sort_unstable();
            // Nodes on the last, incomplete level are red. If n+1 is a power of two
            // there is no such level.
            let red_depth = (sorted.len() + 1).ilog2();
            self.root = self.build(&sorted, EMPTY, 0, red_depth);
            self.len = sorted.len();
        } else {
            for &key in keys {
                self.insert_unchecked(key);
            }
        }
        debug!("insert_bulk {} keys, len={}", keys.len(), self.len);
        Ok(())
    }

    /// Build a size-balanced subtree from sorted keys, returns its root.
    fn build(&mut self, keys: &[Key], parent: Key, depth: u32, red_depth: u32) -> Key {
        if keys.is_empty() {
            return EMPTY;
        }
        let mid = keys.len() / 2;
        let key = keys[mid];
        let left = self.build(&keys[..mid], key, depth + 1, red_depth);
        let right = self.build(&keys[mid + 1..], key, depth + 1, red_depth);
        let color = if depth == red_depth {
            Color::Red
        } else {
            Color::Black
        };
        let sum = Sum::from(key) + self.store.sum(left) + self.store.sum(right);
        self.store.put_fresh(
            key,
            Node {
                key,
                parent,
                left,
                right,
                color,
                sum,
                tombstoned: false,
            },
        );
        key
    }

    /// Remove every key less than or equal to key.
    ///
    /// The tree is split along the search path for key. Subtrees entirely at or below key
    /// are cut off and their nodes tombstoned, the pieces above key are joined back
    /// together bottom-up. Cost is O(log n) plus one visit per discarded node to set its
    /// tombstone.
    pub fn remove_left(&mut self, key: Key) -> Result<()> {
        if key == EMPTY {
            return Err(TreeError::EmptyKey);
        }
        if !self.exists(key) {
            return Err(TreeError::NotFound(key));
        }

        let mut pivots: StkVec<Pivot> = StkVec::new();
        let mut discarded = 0;
        let mut bh = self.black_height();
        let mut n = self.root;
        let (rest, rest_bh) = loop {
            let child_bh = bh - u32::from(!self.store.is_red(n));
            let node = *self.store.node(n);
            if key < n {
                pivots.push(Pivot {
                    key: n,
                    right: node.right,
                    right_bh: child_bh,
                });
                n = node.left;
            } else {
                discarded += self.tombstone(n, node.left);
                if key == n {
                    break (node.right, child_bh);
                }
                n = node.right;
            }
            bh = child_bh;
        };

        let (mut acc, mut acc_bh) = self.detach(rest, rest_bh);
        while let Some(p) = pivots.pop() {
            let (right, right_bh) = self.detach(p.right, p.right_bh);
            (acc, acc_bh) = self.join(acc, acc_bh, p.key, right, right_bh);
        }
        self.root = acc;
        self.len -= discarded;
        debug!(
            "remove_left {key}: discarded {discarded}, len={}, black-height={acc_bh}",
            self.len
        );
        Ok(())
    }

    /// Tombstone key and every node in the subtree below left, returns how many were flagged.
    fn tombstone(&mut self, key: Key, left: Key) -> usize {
        self.store.set_tombstoned(key);
        let mut count = 1;
        let mut stack = vec![left];
        while let Some(k) = stack.pop() {
            if k == EMPTY {
                continue;
            }
            let n = self.store.node(k);
            stack.push(n.left);
            stack.push(n.right);
            self.store.set_tombstoned(k);
            count += 1;
        }
        count
    }

    /// Black-height of the live tree, counting the root.
    fn black_height(&self) -> u32 {
        let mut bh = 0;
        let mut k = self.root;
        while k != EMPTY {
            bh += u32::from(!self.store.is_red(k));
            k = self.store.left(k);
        }
        bh
    }

    /// Cut subtree loose from its parent and make its root black.
    fn detach(&mut self, root: Key, bh: u32) -> (Key, u32) {
        if root == EMPTY {
            return (EMPTY, 0);
        }
        self.store.set_parent(root, EMPTY);
        if self.store.is_red(root) {
            self.store.set_color(root, Color::Black);
            (root, bh + 1)
        } else {
            (root, bh)
        }
    }

    /// Join two detached trees with black roots, every key in left < pivot < every key in right.
    /// Returns the new root (black, detached) and its black-height.
    fn join(&mut self, left: Key, left_bh: u32, pivot: Key, right: Key, right_bh: u32) -> (Key, u32) {
        if left_bh == right_bh {
            self.store.put_fresh(
                pivot,
                Node {
                    key: pivot,
                    parent: EMPTY,
                    left,
                    right,
                    color: Color::Black,
                    sum: 0,
                    tombstoned: false,
                },
            );
            self.store.set_parent(left, pivot);
            self.store.set_parent(right, pivot);
            self.store.pull_sum(pivot);
            return (pivot, left_bh + 1);
        }

        // Walk the inner spine of the taller tree to the first black node whose
        // black-height matches the shorter tree, the pivot goes in its place.
        let tall_left = left_bh > right_bh;
        let (tall, short, target) = if tall_left {
            (left, right, right_bh)
        } else {
            (right, left, left_bh)
        };
        let mut p = EMPTY;
        let mut c = tall;
        let mut c_bh = if tall_left { left_bh } else { right_bh };
        while c != EMPTY && (self.store.is_red(c) || c_bh != target) {
            c_bh -= u32::from(!self.store.is_red(c));
            p = c;
            c = if tall_left {
                self.store.right(c)
            } else {
                self.store.left(c)
            };
        }

        let (l, r) = if tall_left { (c, short) } else { (short, c) };
        self.store.put_fresh(
            pivot,
            Node {
                key: pivot,
                parent: p,
                left: l,
                right: r,
                color: Color::Red,
                sum: 0,
                tombstoned: false,
            },
        );
        self.store.set_parent(l, pivot);
        self.store.set_parent(r, pivot);
        if tall_left {
            self.store.set_right(p, pivot);
        } else {
            self.store.set_left(p, pivot);
        }
        self.store.pull_sum(pivot);
        self.update_sums(p);

        self.root = tall;
        self.insert_fixup(pivot);
        let grew = self.blacken_root();
        (self.root, left_bh.max(right_bh) + u32::from(grew))
    }

    /// Was key discarded by [`RbTree::remove_left`]?
    ///
    /// Fails only for a key that was never inserted. Key 0 is never tombstoned.
    pub fn subtree_removed(&self, key: Key) -> Result<bool> {
        Ok(self.store.get(key)?.tombstoned)
    }

    /// [`RbTree::subtree_removed`] for a batch of keys, unknown keys report false.
    #[must_use]
    pub fn subtree_removed_recursive(&self, keys: &[Key]) -> Vec<bool> {
        keys.iter()
            .map(|&k| self.subtree_removed(k).unwrap_or(false))
            .collect()
    }

    /// Sum of the keys in the subtree rooted at key.
    ///
    /// For a tombstoned key this is the value when it was discarded, for a removed key it is 0.
    pub fn sums(&self, key: Key) -> Result<Sum> {
        Ok(self.store.get(key)?.sum)
    }

    /// Sum of all keys in the tree.
    #[must_use]
    pub fn total(&self) -> Sum {
        self.store.sum(self.root)
    }

    /// Sum of all keys less than or equal to key.
    #[must_use]
    pub fn prefix_sum(&self, key: Key) -> Sum {
        let mut result = 0;
        let mut n = self.root;
        while n != EMPTY {
            let node = self.store.node(n);
            if key < n {
                n = node.left;
            } else {
                result += Sum::from(n) + self.store.sum(node.left);
                n = node.right;
            }
        }
        result
    }
}
