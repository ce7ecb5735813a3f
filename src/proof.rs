//! Membership proofs.
//!
//! [`combine`] is commutative, so a proof only needs the sibling digest and the parent key
//! at every level; the side a subtree hangs on never enters the digest.

use alloc::vec::Vec;
use sha3::Digest;

use crate::hash::{NodeHash, combine, node_hash};

/// Authentication data for a single ancestor in a [`Proof`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofNode {
    /// Key of the ancestor.
    pub parent_key: Vec<u8>,
    /// Digest of the ancestor's other child, empty when that child is absent.
    pub sibling_hash: NodeHash,
}

/// Membership proof for a single key.
///
/// A proof commits to a byte string appearing as a leaf-or-subtree digest somewhere under
/// the root. Because a leaf's digest is its raw key and [`combine`] carries no side
/// information, the digest of an inner subtree (and the root digest itself, with an empty
/// proof) verifies just like a stored key does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    /// Ancestors from the proven node's parent up to the root.
    pub prefix: Vec<ProofNode>,
    /// Digests of the proven node's children, empty when absent.
    pub suffix: [NodeHash; 2],
}

impl Proof {
    /// Folds the proof for `key` into the root digest it commits to.
    pub fn compute_root<H: Digest>(&self, key: &[u8]) -> NodeHash {
        let [left, right] = &self.suffix;
        let mut acc = node_hash::<H>(key, non_empty(left), non_empty(right));
        for node in &self.prefix {
            let children = combine::<H>(&acc, &node.sibling_hash);
            acc = combine::<H>(&children, &node.parent_key);
        }
        acc
    }

    /// Returns `true` when folding `key` through the proof yields `expected_root`.
    ///
    /// This holds for every stored key with its generated proof, but also for byte strings
    /// that equal an inner subtree digest, so a passing check does not by itself show that
    /// `key` was inserted. Verifiers must reject candidates that could be digests (for
    /// example, by key length) when that distinction matters.
    ///
    /// ```
    /// use merkle_treap::{Keccak256, MerkleTreap};
    ///
    /// let mut tree = MerkleTreap::<Keccak256>::new();
    /// tree.insert(b"a".to_vec(), 10);
    /// tree.insert(b"b".to_vec(), 20);
    /// tree.insert(b"c".to_vec(), 5);
    ///
    /// let root = tree.root_hash().unwrap().to_vec();
    /// let proof = tree.generate_proof(b"c").unwrap();
    /// assert!(proof.verify::<Keccak256>(b"c", &root));
    /// assert!(!proof.verify::<Keccak256>(b"x", &root));
    /// ```
    #[inline]
    pub fn verify<H: Digest>(&self, key: &[u8], expected_root: &[u8]) -> bool {
        self.compute_root::<H>(key) == expected_root
    }

    /// Number of ancestors of the proven node.
    #[inline]
    pub fn depth(&self) -> usize {
        self.prefix.len()
    }
}

#[inline(always)]
fn non_empty(hash: &[u8]) -> Option<&[u8]> {
    (!hash.is_empty()).then_some(hash)
}
