#![no_std]
#![cfg_attr(not(test), deny(missing_docs))]

//! Authenticated treap with caller-supplied priorities.
//!
//! A [`MerkleTreap`] is a binary search tree ordered by byte-string keys and heap-ordered by
//! priorities the caller provides. Every node caches a digest covering its own key and its
//! whole subtree, so the digest of the root commits to the entire keyset and can be read in
//! `O(1)`.
//!
//! All structural changes go through two primitives: `split`, which partitions a subtree
//! around a pivot key, and `merge`, which joins two order-compatible subtrees by priority.
//! Whenever either of them relinks a node, the node's digest is recomputed before the
//! operation returns, so no stale digest is ever observable.
//!
//! # Digests
//!
//! * A leaf's digest is its key.
//! * An inner node's digest is `combine(combine(left, right), key)`, with an absent child
//!   contributing the empty string.
//! * [`combine`] hashes the lexicographically sorted concatenation of its two inputs and
//!   passes a lone non-empty input through unchanged.
//!
//! # Complexity
//!
//! With independently random priorities the tree has expected logarithmic height, yielding:
//!
//! * [`MerkleTreap::insert`], [`MerkleTreap::remove`], [`MerkleTreap::search`] – `O(log n)`
//!   expected time.
//! * [`MerkleTreap::generate_proof`] – `O(log n)` time and proof size.
//! * [`MerkleTreap::root_hash`] – `O(1)`.
//!
//! Monotone or adversarial priorities degrade the tree to linear height. Every traversal is
//! iterative, so such trees are slow but never overflow the call stack.

extern crate alloc;

mod error;
mod hash;
mod priority;
mod proof;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use sha3::Digest;
use tracing::{debug, trace, warn};

pub use error::{Result, TreapError};
pub use hash::{NodeHash, combine};
#[cfg(feature = "rand")]
pub use priority::RandomPriorities;
pub use priority::{KeyDerived, Priority, PrioritySource};
pub use proof::{Proof, ProofNode};
pub use sha3::Keccak256;

type Link<P> = Option<Box<Node<P>>>;

/// A single entry of a [`MerkleTreap`].
///
/// Nodes are only reachable through a tree and are read-only from the outside.
pub struct Node<P: Priority> {
    key: Vec<u8>,
    priority: P,
    hash: NodeHash,
    left: Link<P>,
    right: Link<P>,
}

impl<P: Priority> Node<P> {
    #[inline(always)]
    fn new(key: Vec<u8>, priority: P) -> Self {
        let hash = key.clone();
        Self {
            key,
            priority,
            hash,
            left: None,
            right: None,
        }
    }

    /// The key stored in this node.
    #[inline(always)]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The priority the node was inserted with.
    #[inline(always)]
    pub fn priority(&self) -> P {
        self.priority
    }

    /// Digest of this node and everything below it.
    #[inline(always)]
    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    /// Left child, holding strictly smaller keys.
    #[inline(always)]
    pub fn left(&self) -> Option<&Node<P>> {
        self.left.as_deref()
    }

    /// Right child, holding strictly greater keys.
    #[inline(always)]
    pub fn right(&self) -> Option<&Node<P>> {
        self.right.as_deref()
    }

    #[inline(always)]
    fn left_hash(&self) -> Option<&[u8]> {
        self.left.as_ref().map(|child| child.hash.as_slice())
    }

    #[inline(always)]
    fn right_hash(&self) -> Option<&[u8]> {
        self.right.as_ref().map(|child| child.hash.as_slice())
    }

    #[inline(always)]
    fn expected_hash<H: Digest>(&self) -> NodeHash {
        hash::node_hash::<H>(&self.key, self.left_hash(), self.right_hash())
    }

    #[inline(always)]
    fn update_hash<H: Digest>(&mut self) {
        self.hash = self.expected_hash::<H>();
    }
}

impl<P: Priority> fmt::Debug for Node<P> {
    // Children are reported by presence only; descending would recurse once per level.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("priority", &self.priority)
            .field("hash", &self.hash)
            .field("has_left", &self.left.is_some())
            .field("has_right", &self.right.is_some())
            .finish()
    }
}

/// Which half of a split a node lands in.
enum Partition {
    Less,
    GreaterOrEqual,
}

enum Direction {
    Left,
    Right,
}

/// Authenticated treap keyed by byte strings.
///
/// `H` is the digest used by [`combine`] and stays fixed for the lifetime of the tree. `P` is
/// the priority type; priorities are always supplied by the caller, either directly to
/// [`MerkleTreap::insert`] or through a [`PrioritySource`].
///
/// # Examples
///
/// ```
/// use merkle_treap::{Keccak256, MerkleTreap};
///
/// let mut tree = MerkleTreap::<Keccak256>::new();
/// assert!(tree.root_hash().is_none());
///
/// tree.insert(b"alice".to_vec(), 42);
/// tree.insert(b"bob".to_vec(), 7);
///
/// assert!(tree.contains(b"alice"));
/// assert_eq!(tree.search(b"bob").map(|node| node.priority()), Some(7));
///
/// let before = tree.root_hash().unwrap().to_vec();
/// assert!(tree.remove(b"bob"));
/// assert_ne!(tree.root_hash().unwrap(), before.as_slice());
/// ```
pub struct MerkleTreap<H = Keccak256, P = u64>
where
    H: Digest,
    P: Priority,
{
    root: Link<P>,
    size: usize,
    _hasher: PhantomData<H>,
}

impl<H, P> MerkleTreap<H, P>
where
    H: Digest,
    P: Priority,
{
    /// Creates an empty tree.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            root: None,
            size: 0,
            _hasher: PhantomData,
        }
    }

    /// Returns the number of keys stored in the tree.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns whether the tree contains no keys.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the root digest, or `None` when the tree is empty.
    #[inline(always)]
    pub fn root_hash(&self) -> Option<&[u8]> {
        self.root.as_ref().map(|node| node.hash.as_slice())
    }

    /// Returns the root node, if any.
    #[inline(always)]
    pub fn root(&self) -> Option<&Node<P>> {
        self.root.as_deref()
    }

    /// Inserts `key` with the given priority.
    ///
    /// Returns `false` and leaves the tree untouched when the key is already present.
    pub fn insert<K>(&mut self, key: K, priority: P) -> bool
    where
        K: Into<Vec<u8>>,
    {
        self.insert_unique(key.into(), |_| priority)
    }

    /// Inserts `key` with a priority drawn from `source`.
    ///
    /// The source is not consulted when the key is already present.
    pub fn insert_with<K, S>(&mut self, key: K, source: &mut S) -> bool
    where
        K: Into<Vec<u8>>,
        S: PrioritySource<P> + ?Sized,
    {
        self.insert_unique(key.into(), |key| source.priority_for(key))
    }

    /// Splits at `key` and merges a fresh node back in, asking for its priority only once
    /// the key is known to be absent.
    fn insert_unique<F>(&mut self, key: Vec<u8>, priority: F) -> bool
    where
        F: FnOnce(&[u8]) -> P,
    {
        if self.contains(&key) {
            debug!(key_len = key.len(), "duplicate key rejected");
            return false;
        }

        let priority = priority(&key);
        let node = Box::new(Node::new(key, priority));
        let (less, greater) = Self::split(self.root.take(), &node.key);
        self.root = Self::merge(Self::merge(less, Some(node)), greater);
        self.size += 1;
        trace!(?priority, size = self.size, "inserted key");
        true
    }

    /// Looks up the node holding `key`.
    pub fn search(&self, key: &[u8]) -> Option<&Node<P>> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match key.cmp(node.key.as_slice()) {
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => current = node.right.as_deref(),
                Ordering::Equal => return Some(node),
            }
        }
        None
    }

    /// Returns `true` if `key` is stored in the tree.
    #[inline]
    pub fn contains(&self, key: &[u8]) -> bool {
        self.search(key).is_some()
    }

    /// Removes `key` from the tree.
    ///
    /// Returns `false` without touching the tree when the key is absent.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        if !self.contains(key) {
            debug!(key_len = key.len(), "remove of absent key ignored");
            return false;
        }

        // Equal keys route right, so the target is the minimum of `greater`.
        let (less, greater) = Self::split(self.root.take(), key);
        let greater = match greater {
            Some(mut node) if node.key.as_slice() == key => {
                Self::merge(node.left.take(), node.right.take())
            }
            Some(node) => Some(Self::remove_from_left_spine(node, key)),
            None => None,
        };
        self.root = Self::merge(less, greater);
        self.size -= 1;
        trace!(key_len = key.len(), size = self.size, "removed key");
        true
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        drop_iteratively(self.root.take());
        self.size = 0;
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(&Node<P>, usize)> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, 1));
        }
        while let Some((node, depth)) = stack.pop() {
            height = height.max(depth);
            if let Some(left) = node.left.as_deref() {
                stack.push((left, depth + 1));
            }
            if let Some(right) = node.right.as_deref() {
                stack.push((right, depth + 1));
            }
        }
        height
    }

    /// Iterates over the nodes in ascending key order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, P> {
        Iter::new(self.root.as_deref())
    }

    /// Generates a membership proof for `key`.
    ///
    /// The proof authenticates `key` as a byte string whose leaf-or-subtree digest sits on a
    /// path to the root, not as a stored key: leaves hash to their raw key and [`combine`]
    /// ignores sides, so an inner digest also verifies. Use [`MerkleTreap::contains`] when
    /// the tree itself is at hand. See [`Proof::verify`].
    ///
    /// Fails with [`TreapError::EmptyTree`] on an empty tree and with
    /// [`TreapError::KeyNotFound`] when the key is absent.
    pub fn generate_proof(&self, key: &[u8]) -> Result<Proof> {
        let mut current = self.root.as_deref().ok_or(TreapError::EmptyTree)?;
        let mut path: Vec<(&Node<P>, Direction)> = Vec::new();

        loop {
            let (next, direction) = match key.cmp(current.key.as_slice()) {
                Ordering::Less => (current.left.as_deref(), Direction::Left),
                Ordering::Greater => (current.right.as_deref(), Direction::Right),
                Ordering::Equal => break,
            };
            match next {
                Some(child) => {
                    path.push((current, direction));
                    current = child;
                }
                None => return Err(TreapError::KeyNotFound { key: key.to_vec() }),
            }
        }

        let prefix = path
            .into_iter()
            .rev()
            .map(|(node, direction)| {
                let sibling = match direction {
                    Direction::Left => node.right_hash(),
                    Direction::Right => node.left_hash(),
                };
                ProofNode {
                    parent_key: node.key.clone(),
                    sibling_hash: sibling.map(<[u8]>::to_vec).unwrap_or_default(),
                }
            })
            .collect();

        let suffix = [
            current.left_hash().map(<[u8]>::to_vec).unwrap_or_default(),
            current.right_hash().map(<[u8]>::to_vec).unwrap_or_default(),
        ];

        Ok(Proof { prefix, suffix })
    }

    /// Checks the ordering, heap and digest invariants of every node.
    ///
    /// Each node's digest is recomputed from its key and its children's digests, so a
    /// successful run proves the root digest matches a from-scratch recomputation.
    pub fn validate(&self) -> Result<()> {
        let mut stack: Vec<(&Node<P>, Option<&[u8]>, Option<&[u8]>)> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, None, None));
        }

        while let Some((node, lower, upper)) = stack.pop() {
            let key = node.key.as_slice();
            let ordered =
                lower.is_none_or(|bound| bound < key) && upper.is_none_or(|bound| key < bound);
            if !ordered {
                warn!(key_len = key.len(), "ordering violation");
                return Err(TreapError::OrderViolation { key: key.to_vec() });
            }

            let heap_ok = [node.left.as_deref(), node.right.as_deref()]
                .into_iter()
                .flatten()
                .all(|child| child.priority <= node.priority);
            if !heap_ok {
                warn!(key_len = key.len(), "heap violation");
                return Err(TreapError::HeapViolation { key: key.to_vec() });
            }

            if node.hash != node.expected_hash::<H>() {
                warn!(key_len = key.len(), "stale digest");
                return Err(TreapError::StaleDigest { key: key.to_vec() });
            }

            if let Some(left) = node.left.as_deref() {
                stack.push((left, lower, Some(key)));
            }
            if let Some(right) = node.right.as_deref() {
                stack.push((right, Some(key), upper));
            }
        }
        Ok(())
    }

    /// Partitions `tree` into keys `< key` and keys `>= key`.
    fn split(tree: Link<P>, key: &[u8]) -> (Link<P>, Link<P>) {
        let mut path: Vec<(Box<Node<P>>, Partition)> = Vec::new();
        let mut current = tree;
        while let Some(mut node) = current {
            if node.key.as_slice() < key {
                current = node.right.take();
                path.push((node, Partition::Less));
            } else {
                current = node.left.take();
                path.push((node, Partition::GreaterOrEqual));
            }
        }

        let mut less = None;
        let mut greater = None;
        while let Some((mut node, partition)) = path.pop() {
            match partition {
                Partition::Less => {
                    node.right = less;
                    node.update_hash::<H>();
                    less = Some(node);
                }
                Partition::GreaterOrEqual => {
                    node.left = greater;
                    node.update_hash::<H>();
                    greater = Some(node);
                }
            }
        }
        (less, greater)
    }

    /// Joins two subtrees where every key in `left` is below every key in `right`.
    ///
    /// `left` becomes the root only on strictly higher priority; ties go to `right`.
    fn merge(left: Link<P>, right: Link<P>) -> Link<P> {
        let mut path: Vec<(Box<Node<P>>, Direction)> = Vec::new();
        let mut left = left;
        let mut right = right;
        let mut merged = loop {
            match (left, right) {
                (None, tree) | (tree, None) => break tree,
                (Some(mut l), Some(mut r)) => {
                    if l.priority > r.priority {
                        left = l.right.take();
                        right = Some(r);
                        path.push((l, Direction::Right));
                    } else {
                        right = r.left.take();
                        left = Some(l);
                        path.push((r, Direction::Left));
                    }
                }
            }
        };

        while let Some((mut node, slot)) = path.pop() {
            match slot {
                Direction::Left => node.left = merged,
                Direction::Right => node.right = merged,
            }
            node.update_hash::<H>();
            merged = Some(node);
        }
        merged
    }

    /// Removes `key` from the left spine of `root`, refreshing digests along the spine.
    fn remove_from_left_spine(root: Box<Node<P>>, key: &[u8]) -> Box<Node<P>> {
        let mut spine: Vec<Box<Node<P>>> = Vec::new();
        let mut current = root;
        loop {
            match current.left.take() {
                Some(mut child) if child.key.as_slice() == key => {
                    current.left = Self::merge(child.left.take(), child.right.take());
                    current.update_hash::<H>();
                    break;
                }
                Some(child) => {
                    spine.push(current);
                    current = child;
                }
                None => break,
            }
        }

        while let Some(mut parent) = spine.pop() {
            parent.left = Some(current);
            parent.update_hash::<H>();
            current = parent;
        }
        current
    }
}

impl<H, P> Default for MerkleTreap<H, P>
where
    H: Digest,
    P: Priority,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<H, P> Drop for MerkleTreap<H, P>
where
    H: Digest,
    P: Priority,
{
    fn drop(&mut self) {
        drop_iteratively(self.root.take());
    }
}

impl<'a, H, P> IntoIterator for &'a MerkleTreap<H, P>
where
    H: Digest,
    P: Priority,
{
    type Item = &'a Node<P>;
    type IntoIter = Iter<'a, P>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over the nodes of a [`MerkleTreap`].
pub struct Iter<'a, P: Priority> {
    stack: Vec<&'a Node<P>>,
}

impl<'a, P: Priority> Iter<'a, P> {
    fn new(root: Option<&'a Node<P>>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut node: Option<&'a Node<P>>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a, P: Priority> Iterator for Iter<'a, P> {
    type Item = &'a Node<P>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(node)
    }
}

/// Drops a subtree without recursing once per level.
fn drop_iteratively<P: Priority>(tree: Link<P>) {
    let mut stack: Vec<Box<Node<P>>> = tree.into_iter().collect();
    while let Some(mut node) = stack.pop() {
        stack.extend(node.left.take());
        stack.extend(node.right.take());
    }
}
