/// Red-black tree of `u64` keys where every node records the sum of the keys in its subtree.
///
/// General guide to implementation:
///
/// Nodes live in a [`NodeStore`] addressed by their own key, links are keys and key 0
/// ([`EMPTY`]) is the sentinel. Writes to the sentinel are ignored by the store, so the
/// delete fixup carries the parent of the (possibly empty) child explicitly instead of
/// parking it in the sentinel.
///
/// Single insert and remove are here, navigation is in [`crate::iter`] and the bulk
/// operations ( `insert_bulk`, `remove_left` ) are in [`crate::bulk`].
///
/// Every mutating method checks its preconditions before touching any record, so a
/// failed call leaves the tree unchanged.
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RbTree {
    pub(crate) root: Key,
    pub(crate) len: usize,
    pub(crate) store: NodeStore,
}

impl RbTree {
    /// Returns a new, empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of keys in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the tree empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read-only access to the node records.
    #[must_use]
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Insert key.
    pub fn insert(&mut self, key: Key) -> Result<()> {
        if key == EMPTY {
            return Err(TreeError::EmptyKey);
        }
        if self.exists(key) {
            return Err(TreeError::AlreadyExists(key));
        }
        self.insert_unchecked(key);
        trace!("insert {key}, len={}", self.len);
        Ok(())
    }

    /// Insert a key known to be nonzero and not live.
    pub(crate) fn insert_unchecked(&mut self, key: Key) {
        let mut parent = EMPTY;
        let mut cursor = self.root;
        while cursor != EMPTY {
            parent = cursor;
            cursor = if key < cursor {
                self.store.left(cursor)
            } else {
                self.store.right(cursor)
            };
        }
        self.store.put_fresh(key, Node::leaf(key, parent));
        if parent == EMPTY {
            self.root = key;
        } else if key < parent {
            self.store.set_left(parent, key);
        } else {
            self.store.set_right(parent, key);
        }
        self.update_sums(parent);
        self.insert_fixup(key);
        self.blacken_root();
        self.len += 1;
    }

    /// Remove key.
    pub fn remove(&mut self, key: Key) -> Result<()> {
        if key == EMPTY {
            return Err(TreeError::EmptyKey);
        }
        if !self.exists(key) {
            return Err(TreeError::NotFound(key));
        }
        let target = *self.store.node(key);

        // x takes the place of the spliced out node, xp is its parent afterwards.
        let (x, xp, spliced);
        if target.left == EMPTY || target.right == EMPTY {
            x = if target.left != EMPTY {
                target.left
            } else {
                target.right
            };
            xp = target.parent;
            spliced = target.color;
            self.store.set_parent(x, xp);
            self.replace_child(xp, key, x);
        } else {
            let mut y = target.right;
            while self.store.left(y) != EMPTY {
                y = self.store.left(y);
            }
            spliced = self.store.color(y);
            x = self.store.right(y);
            if self.store.parent(y) == key {
                xp = y;
            } else {
                xp = self.store.parent(y);
                self.store.set_parent(x, xp);
                self.store.set_left(xp, x);
                self.store.set_right(y, target.right);
                self.store.set_parent(target.right, y);
            }
            self.store.set_parent(y, target.parent);
            self.replace_child(target.parent, key, y);
            self.store.set_left(y, target.left);
            self.store.set_parent(target.left, y);
            self.store.set_color(y, target.color);
        }
        self.update_sums(xp);
        if spliced == Color::Black {
            self.remove_fixup(x, xp);
        }
        self.store.put_fresh(key, Node::detached(key));
        self.len -= 1;
        trace!("remove {key}, len={}", self.len);
        Ok(())
    }

    /// Recompute sums from key up to the root.
    pub(crate) fn update_sums(&mut self, mut key: Key) {
        while key != EMPTY {
            self.store.pull_sum(key);
            key = self.store.parent(key);
        }
    }

    /// Make parent (or the root if parent is empty) point to new instead of old.
    pub(crate) fn replace_child(&mut self, parent: Key, old: Key, new: Key) {
        if parent == EMPTY {
            self.root = new;
        } else if self.store.left(parent) == old {
            self.store.set_left(parent, new);
        } else {
            self.store.set_right(parent, new);
        }
    }

    fn rotate_left(&mut self, x: Key) {
        let s = &mut self.store;
        let y = s.right(x);
        let b = s.left(y);
        s.set_right(x, b);
        s.set_parent(b, x);
        let p = s.parent(x);
        s.set_parent(y, p);
        self.replace_child(p, x, y);
        let s = &mut self.store;
        s.set_left(y, x);
        s.set_parent(x, y);
        s.pull_sum(x);
        s.pull_sum(y);
    }

    fn rotate_right(&mut self, x: Key) {
        let s = &mut self.store;
        let y = s.left(x);
        let b = s.right(y);
        s.set_left(x, b);
        s.set_parent(b, x);
        let p = s.parent(x);
        s.set_parent(y, p);
        self.replace_child(p, x, y);
        let s = &mut self.store;
        s.set_right(y, x);
        s.set_parent(x, y);
        s.pull_sum(x);
        s.pull_sum(y);
    }

    /// Resolve red-red violations above the red node z.
    /// Stops at whatever node has no parent, so it also works on a detached subtree held in `self.root`.
    pub(crate) fn insert_fixup(&mut self, mut z: Key) {
        while self.store.is_red(self.store.parent(z)) {
            let p = self.store.parent(z);
            let g = self.store.parent(p);
            if p == self.store.left(g) {
                let u = self.store.right(g);
                if self.store.is_red(u) {
                    self.store.set_color(p, Color::Black);
                    self.store.set_color(u, Color::Black);
                    self.store.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.store.right(p) {
                        z = p;
                        self.rotate_left(z);
                    }
                    let p = self.store.parent(z);
                    let g = self.store.parent(p);
                    self.store.set_color(p, Color::Black);
                    self.store.set_color(g, Color::Red);
                    self.rotate_right(g);
                }
            } else {
                let u = self.store.left(g);
                if self.store.is_red(u) {
                    self.store.set_color(p, Color::Black);
                    self.store.set_color(u, Color::Black);
                    self.store.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.store.left(p) {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p = self.store.parent(z);
                    let g = self.store.parent(p);
                    self.store.set_color(p, Color::Black);
                    self.store.set_color(g, Color::Red);
                    self.rotate_left(g);
                }
            }
        }
    }

    /// Colour the root black, returns true if that raised the black-height.
    pub(crate) fn blacken_root(&mut self) -> bool {
        let red = self.store.is_red(self.root);
        self.store.set_color(self.root, Color::Black);
        red
    }

    /// Repair the missing black on the path through x, whose parent is xp ( x may be empty ).
    fn remove_fixup(&mut self, mut x: Key, mut xp: Key) {
        while x != self.root && !self.store.is_red(x) {
            if x == self.store.left(xp) {
                let mut w = self.store.right(xp);
                if self.store.is_red(w) {
                    self.store.set_color(w, Color::Black);
                    self.store.set_color(xp, Color::Red);
                    self.rotate_left(xp);
                    w = self.store.right(xp);
                }
                if !self.store.is_red(self.store.left(w)) && !self.store.is_red(self.store.right(w))
                {
                    self.store.set_color(w, Color::Red);
                    x = xp;
                    xp = self.store.parent(x);
                } else {
                    if !self.store.is_red(self.store.right(w)) {
                        self.store.set_color(self.store.left(w), Color::Black);
                        self.store.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.store.right(xp);
                    }
                    self.store.set_color(w, self.store.color(xp));
                    self.store.set_color(xp, Color::Black);
                    self.store.set_color(self.store.right(w), Color::Black);
                    self.rotate_left(xp);
                    x = self.root;
                }
            } else {
                let mut w = self.store.left(xp);
                if self.store.is_red(w) {
                    self.store.set_color(w, Color::Black);
                    self.store.set_color(xp, Color::Red);
                    self.rotate_right(xp);
                    w = self.store.left(xp);
                }
                if !self.store.is_red(self.store.left(w)) && !self.store.is_red(self.store.right(w))
                {
                    self.store.set_color(w, Color::Red);
                    x = xp;
                    xp = self.store.parent(x);
                } else {
                    if !self.store.is_red(self.store.left(w)) {
                        self.store.set_color(self.store.right(w), Color::Black);
                        self.store.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.store.left(xp);
                    }
                    self.store.set_color(w, self.store.color(xp));
                    self.store.set_color(xp, Color::Black);
                    self.store.set_color(self.store.left(w), Color::Black);
                    self.rotate_right(xp);
                    x = self.root;
                }
            }
        }
        self.store.set_color(x, Color::Black);
    }

    /// Check every structural invariant of the live tree, returns the black-height.
    ///
    /// Verifies search order, parent links, colours, sums, that no reachable node is
    /// tombstoned and that [`RbTree::len`] matches.
    pub fn check(&self) -> Result<u32> {
        let fail = |msg: String| Err(TreeError::InvariantViolation(msg));
        if self.root == EMPTY {
            if self.len != 0 {
                return fail(format!("empty tree with len {}", self.len));
            }
            return Ok(0);
        }
        let root = self.store.get(self.root)?;
        if root.parent != EMPTY {
            return fail(format!("root {} has parent {}", root.key, root.parent));
        }
        if root.is_red() {
            return fail(format!("root {} is red", root.key));
        }

        // Post-order walk with an explicit stack, (key, exclusive bounds, children done).
        // Bounds are u128 so that Key::MAX is a valid key.
        let mut heights: Vec<u32> = Vec::new();
        let mut stack: Vec<(Key, u128, u128, bool)> = vec![(self.root, 0, u128::MAX, false)];
        let mut count = 0;
        while let Some((key, lo, hi, done)) = stack.pop() {
            let n = self.store.get(key)?;
            if done {
                // Child heights, order does not matter.
                let a = heights.pop().unwrap_or(0);
                let b = heights.pop().unwrap_or(0);
                if a != b {
                    return fail(format!("black-height mismatch at {key}: {a} != {b}"));
                }
                let expect = Sum::from(key) + self.store.sum(n.left) + self.store.sum(n.right);
                if n.sum != expect {
                    return fail(format!("sum at {key} is {} expected {expect}", n.sum));
                }
                heights.push(a + u32::from(!n.is_red()));
                continue;
            }
            count += 1;
            if n.tombstoned {
                return fail(format!("tombstoned node {key} is reachable"));
            }
            if u128::from(key) <= lo || u128::from(key) >= hi {
                return fail(format!("key {key} out of order, bounds ({lo}, {hi})"));
            }
            stack.push((key, lo, hi, true));
            for (child, clo, chi) in [(n.right, u128::from(key), hi), (n.left, lo, u128::from(key))] {
                if child == EMPTY {
                    heights.push(0);
                    continue;
                }
                let c = self.store.get(child)?;
                if c.parent != key {
                    return fail(format!("{child} has parent {} expected {key}", c.parent));
                }
                if n.is_red() && c.is_red() {
                    return fail(format!("red {key} has red child {child}"));
                }
                stack.push((child, clo, chi, false));
            }
        }
        if count != self.len {
            return fail(format!("reachable {count} keys but len is {}", self.len));
        }
        Ok(heights.pop().unwrap_or(0))
    }
}

use crate::{Color, Key, Node, NodeStore, Result, Sum, TreeError, EMPTY};
use log::trace;
