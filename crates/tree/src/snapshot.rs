//! Serializable image of a whole forest.
//!
//! A snapshot carries every comment with its boundaries, plus the id counter
//! so that ids are still never reused after a reload. It is produced by
//! [`Forest::snapshot`](crate::Forest::snapshot) and checked again by
//! [`Forest::restore`](crate::Forest::restore); nothing in it is trusted.

#[cfg(test)]
#[path = "tests/snapshot.rs"]
mod tests;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};
use crate::node::Node;

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct ForestSnapshot {
    /// The id the forest will hand out next.
    next_id: u64,
    /// Ordered by tree, then by left boundary.
    nodes: Vec<Node>,
}

impl Default for ForestSnapshot {
    fn default() -> Self {
        Self::new(1, Vec::new())
    }
}

impl ForestSnapshot {
    #[must_use]
    pub const fn new(next_id: u64, nodes: Vec<Node>) -> Self {
        Self { next_id, nodes }
    }

    #[must_use]
    pub const fn next_id(&self) -> u64 {
        self.next_id
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        borsh::to_vec(self).map_err(|err| TreeError::Encode(err.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::try_from_slice(bytes).map_err(|err| TreeError::Restore(err.to_string()))
    }
}
