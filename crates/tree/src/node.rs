//! Comment records as stored in the forest.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::ids::{NodeId, TreeId};

/// Data the Access Layer attaches to a comment.
///
/// The engine carries it around untouched. The only field it ever reads is
/// `created_at`, which orders siblings for ordered insertion and rebuilds.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, Eq, PartialEq,
)]
pub struct Payload {
    pub author: String,
    pub body: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
}

impl Payload {
    #[must_use]
    pub fn new(author: impl Into<String>, body: impl Into<String>, created_at: u64) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
            created_at,
        }
    }
}

/// One comment and its position in its tree.
///
/// `left` and `right` are nested-set boundaries: a node is an ancestor of
/// another iff its interval strictly contains the other's. `parent_id` and
/// `post_id` are cached at creation for lookups; the interval is what
/// defines structure.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, Eq, PartialEq,
)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) tree_id: TreeId,
    pub(crate) post_id: TreeId,
    pub(crate) parent_id: Option<NodeId>,
    pub(crate) left: u64,
    pub(crate) right: u64,
    pub(crate) depth: u32,
    pub(crate) payload: Payload,
}

impl Node {
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub const fn tree_id(&self) -> TreeId {
        self.tree_id
    }

    /// The post this comment belongs to, copied from its parent at creation.
    #[must_use]
    pub const fn post_id(&self) -> TreeId {
        self.post_id
    }

    #[must_use]
    pub const fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }

    #[must_use]
    pub const fn left(&self) -> u64 {
        self.left
    }

    #[must_use]
    pub const fn right(&self) -> u64 {
        self.right
    }

    /// Number of ancestors; 0 for comments made directly on the post.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.right == self.left + 1
    }

    /// Size of the subtree below this node.
    #[must_use]
    #[expect(clippy::integer_division, reason = "boundaries are allocated in pairs")]
    pub fn descendant_count(&self) -> usize {
        usize::try_from((self.right - self.left - 1) / 2).unwrap_or(usize::MAX)
    }

    /// Whether `other` lies strictly inside this node's interval.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.tree_id == other.tree_id && self.left < other.left && other.right < self.right
    }

    /// Sibling order for ordered insertion: creation time, then id.
    #[must_use]
    pub const fn ordering_key(&self) -> (u64, NodeId) {
        (self.payload.created_at, self.id)
    }
}
