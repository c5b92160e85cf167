use thiserror::Error as ThisError;

use crate::ids::{NodeId, TreeId};

pub type Result<T, E = TreeError> = core::result::Result<T, E>;

/// Errors surfaced by the engine.
///
/// Every structural operation checks its preconditions before touching any
/// coordinate, so an error always leaves the affected tree unchanged.
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[non_exhaustive]
pub enum TreeError {
    /// The referenced comment does not exist (or no longer exists).
    #[error("comment {0} not found")]
    NotFound(NodeId),

    /// A parent was supplied that lives in a different tree than the one named.
    #[error("comment {node} belongs to tree {actual}, not tree {expected}")]
    InvalidTree {
        node: NodeId,
        expected: TreeId,
        actual: TreeId,
    },

    /// A tree failed the invariant check or could not be rebuilt.
    #[error("tree {tree} is inconsistent: {reason}")]
    Corrupt { tree: TreeId, reason: String },

    /// A snapshot was rejected on reload.
    #[error("snapshot rejected: {0}")]
    Restore(String),

    /// A snapshot could not be encoded.
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
}

impl TreeError {
    pub(crate) fn corrupt(tree: TreeId, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            tree,
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call could succeed. None of the engine's
    /// failures are transient.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }
}
