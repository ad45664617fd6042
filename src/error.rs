//! Error type shared by the containers.
//!
//! Only two things can go wrong while mutating a tree: storage for a node (or a map entry)
//! cannot be obtained, or a construction capability refuses the value it was handed. Both are
//! reported before the tree is touched, so a failed call leaves the container as it was.
//! Looking up or removing a missing key is not an error.

use thiserror::Error;

/// Errors returned by the mutating operations of [`AvlSet`](crate::avl_tree::AvlSet) and
/// [`AvlMap`](crate::avl_tree::AvlMap).
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// Storage for a new node or entry could not be allocated, or the configured node limit
    /// was reached.
    #[error("failed to allocate storage for a tree node")]
    AllocationFailed,

    /// An [`Assign`](crate::capability::Assign) or [`Reassign`](crate::capability::Reassign)
    /// capability declined to construct the value.
    #[error("value rejected during construction: {0}")]
    Rejected(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
