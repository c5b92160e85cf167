//! A single comment tree encoded as nested sets.
//!
//! Nodes are kept in a vector ordered by `left`, which is pre-order, so the
//! subtree of any node is the contiguous run that follows it. All structural
//! changes are boundary rewrites over this one vector; nothing outside the
//! tree is touched.

#[cfg(test)]
#[path = "tests/tree.rs"]
mod tests;

use core::ops::Range;
use std::collections::HashMap;

use crate::error::{Result, TreeError};
use crate::ids::{NodeId, TreeId};
use crate::node::{Node, Payload};

/// Where a new comment goes among its siblings.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ChildPosition {
    /// After every existing sibling.
    Last,
    /// Before the first sibling with a greater `(created_at, id)` key.
    Ordered,
}

#[derive(Clone, Debug)]
pub(crate) struct Tree {
    id: TreeId,
    /// Pre-order, strictly ascending `left`.
    nodes: Vec<Node>,
    positions: HashMap<NodeId, usize>,
    /// Set once the tree has been dropped from the forest.
    retired: bool,
}

impl Tree {
    pub(crate) fn new(id: TreeId) -> Self {
        Self {
            id,
            nodes: Vec::new(),
            positions: HashMap::new(),
            retired: false,
        }
    }

    /// Adopts nodes loaded from elsewhere. The result is not verified.
    pub(crate) fn from_nodes(id: TreeId, mut nodes: Vec<Node>) -> Self {
        nodes.sort_by_key(|node| node.left);

        let mut tree = Self {
            id,
            nodes,
            positions: HashMap::new(),
            retired: false,
        };
        tree.reindex_from(0);
        tree
    }

    pub(crate) const fn id(&self) -> TreeId {
        self.id
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[cfg(test)]
    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub(crate) const fn is_retired(&self) -> bool {
        self.retired
    }

    pub(crate) fn retire(&mut self) {
        self.retired = true;
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.positions.get(&id).and_then(|&pos| self.nodes.get(pos))
    }

    fn position(&self, id: NodeId) -> Result<usize> {
        self.positions
            .get(&id)
            .copied()
            .ok_or(TreeError::NotFound(id))
    }

    fn reindex_from(&mut self, start: usize) {
        for (pos, node) in self.nodes.iter().enumerate().skip(start) {
            drop(self.positions.insert(node.id, pos));
        }
    }

    /// Positions occupied by the node at `pos` and its descendants.
    fn span(&self, pos: usize) -> Range<usize> {
        let right = self.nodes[pos].right;
        let rest = &self.nodes[pos + 1..];

        pos..pos + 1 + rest.partition_point(|node| node.left < right)
    }

    /// Positions of the direct children of the node at `parent`, or of the
    /// roots when `parent` is `None`.
    fn child_positions(&self, parent: Option<usize>) -> Vec<usize> {
        let (mut cursor, end) = match parent {
            Some(pos) => {
                let span = self.span(pos);
                (span.start + 1, span.end)
            }
            None => (0, self.nodes.len()),
        };

        let mut children = Vec::new();
        while cursor < end {
            children.push(cursor);
            cursor = self.span(cursor).end;
        }
        children
    }

    fn max_right(&self) -> u64 {
        self.nodes.iter().map(|node| node.right).max().unwrap_or(0)
    }

    /// Shifts every boundary at or beyond `at` two places to the right.
    fn open_gap(&mut self, at: u64) {
        for node in &mut self.nodes {
            if node.left >= at {
                node.left += 2;
            }
            if node.right >= at {
                node.right += 2;
            }
        }
    }

    /// Inserts a new leaf under `parent` (or as a root) and returns its
    /// position. The new node takes the boundary pair `(at, at + 1)` where
    /// `at` is the parent's right boundary for [`ChildPosition::Last`], or the
    /// left boundary of the first later sibling for [`ChildPosition::Ordered`].
    pub(crate) fn insert_child(
        &mut self,
        parent: Option<NodeId>,
        id: NodeId,
        payload: Payload,
        position: ChildPosition,
    ) -> Result<usize> {
        let parent_pos = parent.map(|parent| self.position(parent)).transpose()?;

        let (closing, depth, post_id) = match parent_pos {
            Some(pos) => {
                let parent = &self.nodes[pos];
                (parent.right, parent.depth + 1, parent.post_id)
            }
            None => (self.max_right() + 1, 0, self.id),
        };

        let at = match position {
            ChildPosition::Last => closing,
            ChildPosition::Ordered => {
                let key = (payload.created_at, id);
                self.child_positions(parent_pos)
                    .into_iter()
                    .map(|pos| &self.nodes[pos])
                    .find(|sibling| sibling.ordering_key() > key)
                    .map_or(closing, |sibling| sibling.left)
            }
        };

        self.open_gap(at);

        let node = Node {
            id,
            tree_id: self.id,
            post_id,
            parent_id: parent,
            left: at,
            right: at + 1,
            depth,
            payload,
        };

        let pos = self.nodes.partition_point(|existing| existing.left < at);
        self.nodes.insert(pos, node);
        self.reindex_from(pos);

        Ok(pos)
    }

    /// Removes a node with all of its descendants and closes the gap they
    /// leave behind. Returns the removed nodes in pre-order.
    pub(crate) fn remove_subtree(&mut self, id: NodeId) -> Result<Vec<Node>> {
        let pos = self.position(id)?;
        let span = self.span(pos);
        let right = self.nodes[pos].right;
        let width = right - self.nodes[pos].left + 1;

        let removed: Vec<Node> = self.nodes.drain(span).collect();
        for node in &removed {
            drop(self.positions.remove(&node.id));
        }

        for node in &mut self.nodes {
            if node.left > right {
                node.left -= width;
            }
            if node.right > right {
                node.right -= width;
            }
        }
        self.reindex_from(pos);

        Ok(removed)
    }

    /// Removes a single node and lifts its children into its place, keeping
    /// their order. Returns the removed node.
    pub(crate) fn remove_reparenting(&mut self, id: NodeId) -> Result<Node> {
        let pos = self.position(id)?;
        let end = self.span(pos).end;

        let removed = self.nodes.remove(pos);
        drop(self.positions.remove(&removed.id));

        // The former descendants now occupy `pos..end - 1`.
        for node in &mut self.nodes[pos..end - 1] {
            node.left -= 1;
            node.right -= 1;
            node.depth -= 1;
            if node.parent_id == Some(removed.id) {
                node.parent_id = removed.parent_id;
            }
        }

        for node in &mut self.nodes {
            if node.left > removed.right {
                node.left -= 2;
            }
            if node.right > removed.right {
                node.right -= 2;
            }
        }
        self.reindex_from(pos);

        Ok(removed)
    }

    /// Descendants of `id` in pre-order, at most `max_depth` levels below it.
    pub(crate) fn subtree(
        &self,
        id: NodeId,
        max_depth: Option<u32>,
        include_root: bool,
    ) -> Result<Vec<Node>> {
        let pos = self.position(id)?;
        let span = self.span(pos);
        let limit = max_depth.map(|depth| self.nodes[pos].depth.saturating_add(depth));
        let start = if include_root { span.start } else { span.start + 1 };

        Ok(self.nodes[start..span.end]
            .iter()
            .filter(|node| limit.map_or(true, |limit| node.depth <= limit))
            .cloned()
            .collect())
    }

    /// The whole tree in pre-order, optionally cut off below `max_depth`.
    pub(crate) fn listing(&self, max_depth: Option<u32>) -> Vec<Node> {
        self.nodes
            .iter()
            .filter(|node| max_depth.map_or(true, |limit| node.depth <= limit))
            .cloned()
            .collect()
    }

    pub(crate) fn children(&self, id: NodeId) -> Result<Vec<Node>> {
        let pos = self.position(id)?;

        Ok(self
            .child_positions(Some(pos))
            .into_iter()
            .map(|child| self.nodes[child].clone())
            .collect())
    }

    /// Root-first chain of nodes whose interval contains `id`.
    pub(crate) fn ancestors(&self, id: NodeId, include_self: bool) -> Result<Vec<Node>> {
        let pos = self.position(id)?;
        let node = &self.nodes[pos];

        let mut chain: Vec<Node> = self.nodes[..pos]
            .iter()
            .filter(|candidate| candidate.contains(node))
            .cloned()
            .collect();
        if include_self {
            chain.push(node.clone());
        }
        Ok(chain)
    }

    pub(crate) fn max_depth(&self) -> Option<u32> {
        self.nodes.iter().map(|node| node.depth).max()
    }

    /// Checks the nested-set invariants: strictly ascending, compact
    /// boundaries starting at 1; intervals either disjoint or nested; depth,
    /// parent link and post link agreeing with the intervals.
    pub(crate) fn verify(&self) -> Result<()> {
        let corrupt = |reason: String| TreeError::corrupt(self.id, reason);

        if self.positions.len() != self.nodes.len() {
            return Err(corrupt(format!(
                "position index holds {} entries for {} nodes",
                self.positions.len(),
                self.nodes.len()
            )));
        }

        let mut open: Vec<&Node> = Vec::new();
        let mut next = 1_u64;

        for (pos, node) in self.nodes.iter().enumerate() {
            if self.positions.get(&node.id) != Some(&pos) {
                return Err(corrupt(format!("comment {} is mis-indexed", node.id)));
            }
            if node.tree_id != self.id || node.post_id != self.id {
                return Err(corrupt(format!(
                    "comment {} claims tree {} and post {}",
                    node.id, node.tree_id, node.post_id
                )));
            }
            if node.left >= node.right {
                return Err(corrupt(format!(
                    "comment {} has inverted boundaries ({}, {})",
                    node.id, node.left, node.right
                )));
            }

            while let Some(top) = open.last() {
                if top.right > node.left {
                    break;
                }
                if top.right != next {
                    return Err(corrupt(format!(
                        "comment {} closes at {}, expected {next}",
                        top.id, top.right
                    )));
                }
                next += 1;
                drop(open.pop());
            }

            if node.left != next {
                return Err(corrupt(format!(
                    "comment {} opens at {}, expected {next}",
                    node.id, node.left
                )));
            }
            next += 1;

            if let Some(parent) = open.last() {
                if node.right >= parent.right {
                    return Err(corrupt(format!(
                        "comment {} overlaps comment {}",
                        node.id, parent.id
                    )));
                }
            }

            if u32::try_from(open.len()).ok() != Some(node.depth) {
                return Err(corrupt(format!(
                    "comment {} has depth {} but {} ancestors",
                    node.id,
                    node.depth,
                    open.len()
                )));
            }

            let expected_parent = open.last().map(|parent| parent.id);
            if node.parent_id != expected_parent {
                return Err(corrupt(format!(
                    "comment {} links to parent {:?}, its interval says {:?}",
                    node.id, node.parent_id, expected_parent
                )));
            }

            open.push(node);
        }

        while let Some(top) = open.pop() {
            if top.right != next {
                return Err(corrupt(format!(
                    "comment {} closes at {}, expected {next}",
                    top.id, top.right
                )));
            }
            next += 1;
        }

        Ok(())
    }

    /// Recomputes every boundary and depth from the `parent_id` links,
    /// ordering siblings by `(created_at, id)`. The tree is only replaced if
    /// the links form a proper forest.
    pub(crate) fn rebuild(&mut self) -> Result<()> {
        let mut children: HashMap<Option<NodeId>, Vec<usize>> = HashMap::new();

        for (pos, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent_id {
                if !self.positions.contains_key(&parent) {
                    return Err(TreeError::corrupt(
                        self.id,
                        format!("comment {} links to missing parent {parent}", node.id),
                    ));
                }
            }
            children.entry(node.parent_id).or_default().push(pos);
        }
        for siblings in children.values_mut() {
            siblings.sort_by_key(|&pos| self.nodes[pos].ordering_key());
        }

        enum Visit {
            Enter(usize, u32),
            Exit(usize),
        }

        let mut rebuilt: Vec<Node> = Vec::with_capacity(self.nodes.len());
        let mut slots: HashMap<NodeId, usize> = HashMap::new();
        let mut stack: Vec<Visit> = children
            .get(&None)
            .into_iter()
            .flatten()
            .rev()
            .map(|&pos| Visit::Enter(pos, 0))
            .collect();
        let mut next = 1_u64;

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(pos, depth) => {
                    let mut node = self.nodes[pos].clone();
                    node.left = next;
                    node.depth = depth;
                    node.post_id = self.id;
                    next += 1;

                    drop(slots.insert(node.id, rebuilt.len()));
                    stack.push(Visit::Exit(pos));
                    stack.extend(
                        children
                            .get(&Some(node.id))
                            .into_iter()
                            .flatten()
                            .rev()
                            .map(|&child| Visit::Enter(child, depth + 1)),
                    );
                    rebuilt.push(node);
                }
                Visit::Exit(pos) => {
                    if let Some(&slot) = slots.get(&self.nodes[pos].id) {
                        rebuilt[slot].right = next;
                        next += 1;
                    }
                }
            }
        }

        if rebuilt.len() != self.nodes.len() {
            return Err(TreeError::corrupt(
                self.id,
                format!(
                    "{} comments are unreachable from the roots (parent cycle)",
                    self.nodes.len() - rebuilt.len()
                ),
            ));
        }

        self.nodes = rebuilt;
        self.positions.clear();
        self.reindex_from(0);

        Ok(())
    }
}
