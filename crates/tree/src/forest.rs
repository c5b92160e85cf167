//! The forest of comment trees and the engine's public entry points.
//!
//! Each tree sits behind its own `RwLock`: structural operations take it
//! exclusively, queries take it shared, and operations on different trees
//! never contend. The forest-wide maps (tree table and node→tree index) are
//! only ever locked after a tree lock or on their own, never the other way
//! round.

#[cfg(test)]
#[path = "tests/forest.rs"]
mod tests;

use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ForestConfig;
use crate::error::{Result, TreeError};
use crate::ids::{NodeId, TreeId};
use crate::node::{Node, Payload};
use crate::snapshot::ForestSnapshot;
use crate::tree::{ChildPosition, Tree};

type TreeHandle = Arc<RwLock<Tree>>;

/// Aggregate counters across the forest.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ForestStats {
    pub tree_count: usize,
    pub node_count: usize,
    /// Deepest comment level anywhere in the forest.
    pub max_depth: Option<u32>,
}

/// Threaded tree engine: one nested-set tree per post.
#[derive(Debug)]
pub struct Forest {
    config: ForestConfig,
    trees: RwLock<HashMap<TreeId, TreeHandle>>,
    index: RwLock<HashMap<NodeId, TreeId>>,
    next_id: AtomicU64,
}

impl Default for Forest {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl Forest {
    #[must_use]
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: RwLock::new(HashMap::new()),
            index: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Adds a comment as the last child of `parent`, or as the last
    /// top-level comment of `tree` when there is no parent.
    pub fn append_child(
        &self,
        parent: Option<NodeId>,
        tree: TreeId,
        payload: Payload,
    ) -> Result<NodeId> {
        self.insert(parent, tree, payload, ChildPosition::Last)
    }

    /// Adds a comment among the children of `parent` (or the top-level
    /// comments of `tree`) ordered by creation time, then id.
    pub fn insert_child_ordered(
        &self,
        parent: Option<NodeId>,
        tree: TreeId,
        payload: Payload,
    ) -> Result<NodeId> {
        self.insert(parent, tree, payload, ChildPosition::Ordered)
    }

    fn insert(
        &self,
        parent: Option<NodeId>,
        tree_id: TreeId,
        payload: Payload,
        position: ChildPosition,
    ) -> Result<NodeId> {
        if let Some(parent) = parent {
            let actual = self.tree_id_of(parent)?;
            if actual != tree_id {
                return Err(TreeError::InvalidTree {
                    node: parent,
                    expected: tree_id,
                    actual,
                });
            }
        }

        loop {
            let handle = match parent {
                Some(parent) => self.handle(tree_id).ok_or(TreeError::NotFound(parent))?,
                None => self.handle_or_create(tree_id),
            };
            let mut tree = handle.write();

            // Lost a race with the deletion of the tree's last comment.
            if tree.is_retired() {
                continue;
            }

            let id = NodeId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
            let pos = self.mutate(&mut tree, |staged| {
                staged.insert_child(parent, id, payload, position)
            })?;
            drop(self.index.write().insert(id, tree_id));

            let node = &tree.nodes()[pos];
            debug!(
                %tree_id,
                comment = %id,
                parent = ?parent,
                left = node.left(),
                depth = node.depth(),
                ?position,
                "Inserted comment"
            );

            return Ok(id);
        }
    }

    /// Removes a comment together with all of its replies. Returns how many
    /// comments were removed.
    pub fn delete_subtree(&self, node: NodeId) -> Result<usize> {
        let handle = self.handle_of(node)?;
        let mut tree = handle.write();

        let removed = self.mutate(&mut tree, |staged| staged.remove_subtree(node))?;
        {
            let mut index = self.index.write();
            for gone in &removed {
                drop(index.remove(&gone.id()));
            }
        }

        debug!(
            tree_id = %tree.id(),
            comment = %node,
            removed = removed.len(),
            "Deleted comment subtree"
        );
        self.drop_if_empty(&mut tree);

        Ok(removed.len())
    }

    /// Removes a single comment; its replies move up to take its place.
    /// Returns how many comments were removed, which is always 1.
    pub fn delete_node_reparent_children(&self, node: NodeId) -> Result<usize> {
        let handle = self.handle_of(node)?;
        let mut tree = handle.write();

        let removed = self.mutate(&mut tree, |staged| staged.remove_reparenting(node))?;
        drop(self.index.write().remove(&removed.id()));

        debug!(
            tree_id = %tree.id(),
            comment = %node,
            promoted_to = ?removed.parent_id(),
            "Deleted comment, replies promoted"
        );
        self.drop_if_empty(&mut tree);

        Ok(1)
    }

    /// Replies below `root` in thread order, at most `max_depth` levels
    /// deeper than `root`. `root` itself leads the result if `include_root`.
    pub fn subtree(
        &self,
        root: NodeId,
        max_depth: Option<u32>,
        include_root: bool,
    ) -> Result<Vec<Node>> {
        self.handle_of(root)?
            .read()
            .subtree(root, max_depth, include_root)
    }

    /// Every comment of a post in thread order. Unknown posts have none.
    #[must_use]
    pub fn tree_listing(&self, tree: TreeId) -> Vec<Node> {
        self.tree_listing_to_depth(tree, None)
    }

    /// The thread-order listing of a post, cut off below `max_depth`.
    #[must_use]
    pub fn tree_listing_to_depth(&self, tree: TreeId, max_depth: Option<u32>) -> Vec<Node> {
        self.handle(tree)
            .map(|handle| handle.read().listing(max_depth))
            .unwrap_or_default()
    }

    pub fn get(&self, node: NodeId) -> Result<Node> {
        self.handle_of(node)?
            .read()
            .get(node)
            .cloned()
            .ok_or(TreeError::NotFound(node))
    }

    /// Direct replies to `node`, oldest position first.
    pub fn children(&self, node: NodeId) -> Result<Vec<Node>> {
        self.handle_of(node)?.read().children(node)
    }

    /// The chain of comments `node` replies to, top-level comment first.
    pub fn ancestors(&self, node: NodeId, include_self: bool) -> Result<Vec<Node>> {
        self.handle_of(node)?.read().ancestors(node, include_self)
    }

    pub fn descendant_count(&self, node: NodeId) -> Result<usize> {
        self.get(node).map(|node| node.descendant_count())
    }

    /// Ids of all posts that currently have comments, ascending.
    #[must_use]
    pub fn trees(&self) -> Vec<TreeId> {
        let mut ids: Vec<TreeId> = self.trees.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn stats(&self) -> ForestStats {
        let mut stats = ForestStats::default();

        for handle in self.handles() {
            let tree = handle.read();
            if tree.is_retired() {
                continue;
            }
            stats.tree_count += 1;
            stats.node_count += tree.len();
            stats.max_depth = stats.max_depth.max(tree.max_depth());
        }
        stats
    }

    /// Runs the invariant checker over one tree. Unknown trees are trivially
    /// consistent.
    pub fn verify_tree(&self, tree: TreeId) -> Result<()> {
        let Some(handle) = self.handle(tree) else {
            return Ok(());
        };
        let tree = handle.read();

        tree.verify()?;

        let index = self.index.read();
        for node in tree.nodes() {
            if index.get(&node.id()) != Some(&tree.id()) {
                return Err(TreeError::corrupt(
                    tree.id(),
                    format!("comment {} is missing from the forest index", node.id()),
                ));
            }
        }
        Ok(())
    }

    /// Runs the invariant checker over every tree.
    pub fn verify(&self) -> Result<()> {
        for tree in self.trees() {
            self.verify_tree(tree)?;
        }
        Ok(())
    }

    /// Recomputes the boundaries of a tree from its parent links. Returns
    /// the number of comments in the rebuilt tree.
    pub fn rebuild_tree(&self, tree: TreeId) -> Result<usize> {
        let Some(handle) = self.handle(tree) else {
            return Ok(0);
        };
        let mut tree = handle.write();

        self.mutate(&mut tree, Tree::rebuild)?;
        info!(tree_id = %tree.id(), comments = tree.len(), "Rebuilt comment tree");

        Ok(tree.len())
    }

    /// Captures every tree, each one consistent in itself.
    #[must_use]
    pub fn snapshot(&self) -> ForestSnapshot {
        let mut nodes = Vec::new();

        for tree in self.trees() {
            if let Some(handle) = self.handle(tree) {
                nodes.extend(handle.read().nodes().iter().cloned());
            }
        }

        ForestSnapshot::new(self.next_id.load(Ordering::Relaxed), nodes)
    }

    /// Rebuilds a forest from a snapshot, rejecting it unless every tree
    /// passes the invariant checker and every id is unique and allocated.
    pub fn restore(snapshot: ForestSnapshot, config: ForestConfig) -> Result<Self> {
        let reject = |reason: String| {
            warn!(%reason, "Rejected forest snapshot");
            TreeError::Restore(reason)
        };

        let next_id = snapshot.next_id();
        let mut seen = HashSet::new();
        let mut grouped: BTreeMap<TreeId, Vec<Node>> = BTreeMap::new();

        for node in snapshot.into_nodes() {
            if node.id().get() >= next_id {
                return Err(reject(format!(
                    "comment {} was never allocated (next id {next_id})",
                    node.id()
                )));
            }
            if !seen.insert(node.id()) {
                return Err(reject(format!("comment {} appears twice", node.id())));
            }
            grouped.entry(node.tree_id()).or_default().push(node);
        }

        let mut trees = HashMap::with_capacity(grouped.len());
        let mut index = HashMap::with_capacity(seen.len());

        for (tree_id, nodes) in grouped {
            let tree = Tree::from_nodes(tree_id, nodes);
            tree.verify().map_err(|err| reject(err.to_string()))?;

            for node in tree.nodes() {
                drop(index.insert(node.id(), tree_id));
            }
            drop(trees.insert(tree_id, Arc::new(RwLock::new(tree))));
        }

        info!(
            trees = trees.len(),
            comments = index.len(),
            next_id,
            "Restored forest from snapshot"
        );

        Ok(Self {
            config,
            trees: RwLock::new(trees),
            index: RwLock::new(index),
            next_id: AtomicU64::new(next_id),
        })
    }

    /// Applies a structural operation, through a verified staging copy when
    /// the configuration asks for it.
    fn mutate<R>(&self, tree: &mut Tree, op: impl FnOnce(&mut Tree) -> Result<R>) -> Result<R> {
        if !self.config.verify_mutations {
            return op(tree);
        }

        let mut staged = tree.clone();
        let out = op(&mut staged)?;
        staged.verify()?;
        *tree = staged;

        Ok(out)
    }

    fn drop_if_empty(&self, tree: &mut Tree) {
        if !tree.is_empty() {
            return;
        }

        tree.retire();
        drop(self.trees.write().remove(&tree.id()));
        debug!(tree_id = %tree.id(), "Dropped empty comment tree");
    }

    fn tree_id_of(&self, node: NodeId) -> Result<TreeId> {
        self.index
            .read()
            .get(&node)
            .copied()
            .ok_or(TreeError::NotFound(node))
    }

    fn handle(&self, tree: TreeId) -> Option<TreeHandle> {
        self.trees.read().get(&tree).cloned()
    }

    fn handle_or_create(&self, tree: TreeId) -> TreeHandle {
        if let Some(handle) = self.handle(tree) {
            return handle;
        }

        Arc::clone(
            self.trees
                .write()
                .entry(tree)
                .or_insert_with(|| Arc::new(RwLock::new(Tree::new(tree)))),
        )
    }

    /// The tree holding `node`. The caller still has to look the node up
    /// under the tree lock, since it may be deleted in between.
    fn handle_of(&self, node: NodeId) -> Result<TreeHandle> {
        let tree = self.tree_id_of(node)?;
        self.handle(tree).ok_or(TreeError::NotFound(node))
    }

    fn handles(&self) -> Vec<TreeHandle> {
        self.trees.read().values().cloned().collect()
    }
}
