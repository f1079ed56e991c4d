//! The set engine proper: search walker, AVL balancer, insert protocol, and
//! the ordered query surface.
//!
//! The tree's pointer graph is file offsets, never in-memory node objects.
//! Rotations are expressed purely as rewrites of offset fields plus two
//! height updates, which keeps the engine's memory footprint independent of
//! the element count. Parent pointers are not stored; the insertion path is
//! rebuilt by the walker on every insert and consumed bottom-up by the
//! balancer.

use std::cmp::Ordering;
use std::path::Path;

use codec::PayloadCodec;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::format::NIL;
use crate::iter::Iter;
use crate::store::NodeStore;

/// Where a descent for a value ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Site {
    /// The value is stored at the offset on top of the path.
    Present,
    /// The value belongs as the left child of the node on top of the path.
    LeftOf,
    /// The value belongs as the right child of the node on top of the path.
    RightOf,
    /// The set is empty; the path holds the root sentinel.
    EmptyRoot,
}

/// Outcome of a root-to-insertion-site descent: the path of visited offsets
/// (leaf on top) and how the descent terminated. The path is what the
/// balancer ascends; AVL bounds its length at ~1.44·log₂(count+2).
pub(crate) struct Probe {
    pub path: Vec<i64>,
    pub site: Site,
}

/// A persistent, disk-resident ordered set.
///
/// All state lives in a single append-growing file; operations read and
/// write node records through absolute offsets. Elements are encoded by a
/// [`PayloadCodec`] and deduplicated under the decoded value's ordering.
///
/// Every operation takes `&mut self`: the borrow checker enforces the
/// single-actor model, and multi-threaded callers get whole-operation mutual
/// exclusion by wrapping the set in a [`std::sync::Mutex`].
pub struct DiskSet<C: PayloadCodec> {
    store: NodeStore,
    codec: C,
}

impl<C: PayloadCodec> DiskSet<C> {
    /// Opens or creates the set file at `path`.
    ///
    /// An empty file is initialized with a fresh header; a non-empty file's
    /// header is trusted and the existing tree is used as-is.
    pub fn open<P: AsRef<Path>>(path: P, codec: C) -> Result<Self> {
        let store = NodeStore::open(path)?;
        Ok(Self { store, codec })
    }

    /// Flushes the file to stable storage and releases the handle.
    pub fn close(mut self) -> Result<()> {
        self.store.sync()
    }

    /// Inserts `value`; returns `true` if it was absent, `false` if an equal
    /// element is already stored. A failed insert propagates the error
    /// rather than masquerading as "already present".
    pub fn add(&mut self, value: &C::Value) -> Result<bool> {
        let Probe { mut path, site } = self.locate(value)?;
        match site {
            Site::Present => Ok(false),
            Site::EmptyRoot => {
                let payload = self.codec.encode(value)?;
                // The allocator writes at next-free, which the root sentinel
                // already points to; only the count needs updating.
                let off = self.store.allocate(&payload)?;
                self.rebalance(path)?;
                self.store.set_count(1)?;
                debug!(off, len = 1i64, "inserted first element");
                Ok(true)
            }
            Site::LeftOf | Site::RightOf => {
                let payload = self.codec.encode(value)?;
                let off = self.store.allocate(&payload)?;
                let parent = path[path.len() - 1];
                if site == Site::LeftOf {
                    self.store.set_left(parent, off)?;
                } else {
                    self.store.set_right(parent, off)?;
                }
                path.push(off);
                self.rebalance(path)?;
                let len = self.store.count()? + 1;
                self.store.set_count(len)?;
                debug!(off, len, "inserted element");
                Ok(true)
            }
        }
    }

    /// Inserts every element of `values`; returns `true` if any of them was
    /// newly inserted.
    pub fn add_all<I>(&mut self, values: I) -> Result<bool>
    where
        I: IntoIterator<Item = C::Value>,
    {
        let mut any = false;
        for value in values {
            any |= self.add(&value)?;
        }
        Ok(any)
    }

    /// Membership test. O(log n) node reads.
    pub fn contains(&mut self, value: &C::Value) -> Result<bool> {
        Ok(self.locate(value)?.site == Site::Present)
    }

    /// Number of stored elements, re-read from the header.
    pub fn len(&mut self) -> Result<u64> {
        Ok(self.store.count()? as u64)
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.store.count()? == 0)
    }

    /// Smallest element. Fails with [`Error::EmptySet`] on an empty set.
    pub fn first(&mut self) -> Result<C::Value> {
        self.min_value()?.ok_or(Error::EmptySet)
    }

    /// Largest element. Fails with [`Error::EmptySet`] on an empty set.
    pub fn last(&mut self) -> Result<C::Value> {
        self.max_value()?.ok_or(Error::EmptySet)
    }

    /// Strict successor: the smallest stored element comparing greater than
    /// `value`, or `None` if there is none.
    pub fn higher(&mut self, value: &C::Value) -> Result<Option<C::Value>> {
        if self.is_empty()? {
            return Ok(None);
        }
        let root = self.store.root()?;
        self.higher_at(root, value)
    }

    /// Non-strict successor: the smallest stored element comparing greater
    /// than or equal to `value`, or `None` if there is none.
    pub fn ceiling(&mut self, value: &C::Value) -> Result<Option<C::Value>> {
        if self.is_empty()? {
            return Ok(None);
        }
        let root = self.store.root()?;
        self.ceiling_at(root, value)
    }

    /// Non-strict predecessor: the largest stored element comparing less
    /// than or equal to `value`, or `None` if there is none.
    pub fn floor(&mut self, value: &C::Value) -> Result<Option<C::Value>> {
        if self.is_empty()? {
            return Ok(None);
        }
        let root = self.store.root()?;
        self.floor_at(root, value)
    }

    /// In-order iterator. Each step re-seeks from the root (O(log n) reads),
    /// keeping the iterator's own state to a single element.
    pub fn iter(&mut self) -> Iter<'_, C> {
        Iter::new(self)
    }

    // -------------------- removal family (rejected) --------------------

    /// Removal is not provided: the allocator only ever appends, so a
    /// removed node would either leak file space or require compaction.
    pub fn remove(&mut self, _value: &C::Value) -> Result<bool> {
        Err(Error::Unsupported("remove"))
    }

    /// See [`DiskSet::remove`].
    pub fn remove_all<I>(&mut self, _values: I) -> Result<bool>
    where
        I: IntoIterator<Item = C::Value>,
    {
        Err(Error::Unsupported("remove_all"))
    }

    /// See [`DiskSet::remove`].
    pub fn retain_all<I>(&mut self, _values: I) -> Result<bool>
    where
        I: IntoIterator<Item = C::Value>,
    {
        Err(Error::Unsupported("retain_all"))
    }

    /// Bulk membership is not provided.
    pub fn contains_all<I>(&mut self, _values: I) -> Result<bool>
    where
        I: IntoIterator<Item = C::Value>,
    {
        Err(Error::Unsupported("contains_all"))
    }

    /// Clearing is not provided; delete and recreate the file instead.
    pub fn clear(&mut self) -> Result<()> {
        Err(Error::Unsupported("clear"))
    }

    /// Bulk extraction is not provided.
    pub fn to_vec(&mut self) -> Result<Vec<C::Value>> {
        Err(Error::Unsupported("to_vec"))
    }

    // -------------------- walker --------------------

    /// Descends from the root following the element ordering, recording
    /// every visited offset. The result tells the caller whether the value
    /// is present, where it would attach, or that the set is empty.
    fn locate(&mut self, value: &C::Value) -> Result<Probe> {
        let mut cur = self.store.root()?;
        let mut path = vec![cur];
        if self.store.count()? == 0 {
            return Ok(Probe {
                path,
                site: Site::EmptyRoot,
            });
        }
        loop {
            let stored = self.decode_at(cur)?;
            match value.cmp(&stored) {
                Ordering::Less => {
                    let left = self.store.left(cur)?;
                    if left == NIL {
                        return Ok(Probe {
                            path,
                            site: Site::LeftOf,
                        });
                    }
                    cur = left;
                    path.push(cur);
                }
                Ordering::Greater => {
                    let right = self.store.right(cur)?;
                    if right == NIL {
                        return Ok(Probe {
                            path,
                            site: Site::RightOf,
                        });
                    }
                    cur = right;
                    path.push(cur);
                }
                Ordering::Equal => {
                    return Ok(Probe {
                        path,
                        site: Site::Present,
                    });
                }
            }
        }
    }

    pub(crate) fn decode_at(&mut self, off: i64) -> Result<C::Value> {
        let payload = self.store.read_payload(off)?;
        Ok(self.codec.decode(&payload)?)
    }

    // -------------------- balancer --------------------

    /// Ascends the recorded path (leaf toward root), refreshing every
    /// ancestor's height and rotating wherever the AVL balance is violated.
    fn rebalance(&mut self, mut path: Vec<i64>) -> Result<()> {
        while let Some(node) = path.pop() {
            let parent = path.last().copied().unwrap_or(NIL);
            let left = self.store.left(node)?;
            let right = self.store.right(node)?;
            let lh = self.store.height(left)?;
            let rh = self.store.height(right)?;
            if (lh - rh).abs() <= 1 {
                self.store.set_height(node, 1 + lh.max(rh))?;
            } else if lh > rh {
                let ll = self.store.left(left)?;
                let lr = self.store.right(left)?;
                // Equal grand-child heights take the single rotation.
                if self.store.height(ll)? >= self.store.height(lr)? {
                    self.rotate_right(node, parent)?;
                } else {
                    self.rotate_left(left, node)?;
                    self.rotate_right(node, parent)?;
                }
            } else {
                let rr = self.store.right(right)?;
                let rl = self.store.left(right)?;
                if self.store.height(rr)? >= self.store.height(rl)? {
                    self.rotate_left(node, parent)?;
                } else {
                    self.rotate_right(right, node)?;
                    self.rotate_left(node, parent)?;
                }
            }
        }
        Ok(())
    }

    /// Right rotation about `axis`, promoting its left child. `parent == NIL`
    /// means `axis` is the tree root, so the header's root field is
    /// repointed; otherwise the parent's matching child pointer is rewritten.
    /// Requires `axis` to have a present left child.
    fn rotate_right(&mut self, axis: i64, parent: i64) -> Result<()> {
        trace!(axis, parent, "rotate right");
        let pivot = self.store.left(axis)?;
        let transfer = self.store.right(pivot)?;
        self.store.set_left(axis, transfer)?;
        self.store.set_right(pivot, axis)?;
        self.reattach(axis, parent, pivot)?;
        self.refresh_height(axis)?;
        self.refresh_height(pivot)
    }

    /// Mirror of [`DiskSet::rotate_right`]; requires a present right child.
    fn rotate_left(&mut self, axis: i64, parent: i64) -> Result<()> {
        trace!(axis, parent, "rotate left");
        let pivot = self.store.right(axis)?;
        let transfer = self.store.left(pivot)?;
        self.store.set_right(axis, transfer)?;
        self.store.set_left(pivot, axis)?;
        self.reattach(axis, parent, pivot)?;
        self.refresh_height(axis)?;
        self.refresh_height(pivot)
    }

    /// Points whatever referenced `axis` (the header's root field, or one of
    /// the parent's child pointers) at `promoted`.
    fn reattach(&mut self, axis: i64, parent: i64, promoted: i64) -> Result<()> {
        if parent == NIL {
            self.store.set_root(promoted)
        } else if self.store.left(parent)? == axis {
            self.store.set_left(parent, promoted)
        } else {
            self.store.set_right(parent, promoted)
        }
    }

    /// Recomputes one node's stored height from its children, with the
    /// −1-for-absent convention.
    fn refresh_height(&mut self, node: i64) -> Result<()> {
        let left = self.store.left(node)?;
        let right = self.store.right(node)?;
        let lh = self.store.height(left)?;
        let rh = self.store.height(right)?;
        self.store.set_height(node, 1 + lh.max(rh))
    }

    // -------------------- ordered queries --------------------

    pub(crate) fn min_value(&mut self) -> Result<Option<C::Value>> {
        if self.is_empty()? {
            return Ok(None);
        }
        let mut cur = self.store.root()?;
        loop {
            let left = self.store.left(cur)?;
            if left == NIL {
                break;
            }
            cur = left;
        }
        self.decode_at(cur).map(Some)
    }

    fn max_value(&mut self) -> Result<Option<C::Value>> {
        if self.is_empty()? {
            return Ok(None);
        }
        let mut cur = self.store.root()?;
        loop {
            let right = self.store.right(cur)?;
            if right == NIL {
                break;
            }
            cur = right;
        }
        self.decode_at(cur).map(Some)
    }

    fn higher_at(&mut self, off: i64, value: &C::Value) -> Result<Option<C::Value>> {
        if off == NIL {
            return Ok(None);
        }
        let stored = self.decode_at(off)?;
        if stored <= *value {
            // This node cannot be a strict successor; only the right subtree can.
            let right = self.store.right(off)?;
            self.higher_at(right, value)
        } else {
            // Candidate; a tighter answer may sit in the left subtree.
            let left = self.store.left(off)?;
            match self.higher_at(left, value)? {
                Some(found) => Ok(Some(found)),
                None => Ok(Some(stored)),
            }
        }
    }

    fn ceiling_at(&mut self, off: i64, value: &C::Value) -> Result<Option<C::Value>> {
        if off == NIL {
            return Ok(None);
        }
        let stored = self.decode_at(off)?;
        match stored.cmp(value) {
            Ordering::Less => {
                let right = self.store.right(off)?;
                self.ceiling_at(right, value)
            }
            Ordering::Greater => {
                let left = self.store.left(off)?;
                match self.ceiling_at(left, value)? {
                    Some(found) => Ok(Some(found)),
                    None => Ok(Some(stored)),
                }
            }
            Ordering::Equal => Ok(Some(stored)),
        }
    }

    fn floor_at(&mut self, off: i64, value: &C::Value) -> Result<Option<C::Value>> {
        if off == NIL {
            return Ok(None);
        }
        let stored = self.decode_at(off)?;
        match stored.cmp(value) {
            Ordering::Greater => {
                let left = self.store.left(off)?;
                self.floor_at(left, value)
            }
            Ordering::Less => {
                let right = self.store.right(off)?;
                match self.floor_at(right, value)? {
                    Some(found) => Ok(Some(found)),
                    None => Ok(Some(stored)),
                }
            }
            Ordering::Equal => Ok(Some(stored)),
        }
    }

    pub(crate) fn store(&mut self) -> &mut NodeStore {
        &mut self.store
    }
}
