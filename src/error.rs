use crate::Key;
use thiserror::Error;

/// Error returned by tree operations.
///
/// Every error is reported before any record is touched, so a failed call
/// leaves the tree exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The reserved key 0 was used where a real key is required.
    #[error("key is empty")]
    EmptyKey,

    /// Insert of a key that is already in the tree.
    #[error("key {0} already exists")]
    AlreadyExists(Key),

    /// Operation on a key that is absent (or was never created).
    #[error("key {0} not found")]
    NotFound(Key),

    /// Attempted mutation of the sentinel, or a failed structural check.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
