//! Error types for the merkle treap.

use alloc::vec::Vec;
use thiserror::Error;

/// Errors reported by proof generation and structural validation.
///
/// Plain lookups and mutations report absence with `Option`/`bool` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreapError {
    /// The tree holds no keys.
    #[error("tree is empty")]
    EmptyTree,

    /// The requested key is not stored in the tree.
    #[error("key not found: {key:02x?}")]
    KeyNotFound {
        /// Offending key.
        key: Vec<u8>,
    },

    /// A node's key is not strictly between the keys of its ancestors.
    #[error("key {key:02x?} violates search tree ordering")]
    OrderViolation {
        /// Offending key.
        key: Vec<u8>,
    },

    /// A node has a child with strictly higher priority.
    #[error("node {key:02x?} has a child with higher priority")]
    HeapViolation {
        /// Offending key.
        key: Vec<u8>,
    },

    /// A node's cached digest differs from the one recomputed from its children.
    #[error("stale digest at node {key:02x?}")]
    StaleDigest {
        /// Offending key.
        key: Vec<u8>,
    },
}

/// Result type alias for treap operations.
pub type Result<T, E = TreapError> = core::result::Result<T, E>;
