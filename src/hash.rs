//! Digest rules shared by the tree and its proofs.
//!
//! Every digest is a plain byte string. A leaf's digest is its key, and an inner node folds
//! its children's digests and then its own key through [`combine`].

use alloc::vec::Vec;
use sha3::Digest;

/// Digest carried by a node. Leaves carry their raw key, so the width is not fixed.
pub type NodeHash = Vec<u8>;

/// Order-independent pairwise hash.
///
/// An empty operand is the identity: the other side is returned unchanged. Otherwise the two
/// inputs are sorted lexicographically and `H(low || high)` is returned, so
/// `combine(a, b) == combine(b, a)` for all inputs.
///
/// ```
/// use merkle_treap::combine;
/// use merkle_treap::Keccak256;
///
/// assert_eq!(combine::<Keccak256>(b"", b"key"), b"key".to_vec());
/// assert_eq!(
///     combine::<Keccak256>(b"left", b"right"),
///     combine::<Keccak256>(b"right", b"left"),
/// );
/// ```
#[inline]
pub fn combine<H: Digest>(a: &[u8], b: &[u8]) -> NodeHash {
    if a.is_empty() {
        return b.to_vec();
    }
    if b.is_empty() {
        return a.to_vec();
    }

    let (low, high) = if a <= b { (a, b) } else { (b, a) };

    let mut hasher = H::new();
    hasher.update(low);
    hasher.update(high);
    hasher.finalize().to_vec()
}

/// Digest of a node with the given key and child digests (`None` for an absent child).
#[inline]
pub(crate) fn node_hash<H: Digest>(key: &[u8], left: Option<&[u8]>, right: Option<&[u8]>) -> NodeHash {
    match (left, right) {
        (None, None) => key.to_vec(),
        _ => {
            let children = combine::<H>(left.unwrap_or_default(), right.unwrap_or_default());
            combine::<H>(&children, key)
        }
    }
}
