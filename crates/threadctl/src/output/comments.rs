use comfy_table::{Cell, Color, Table};
use serde::Serialize;
use threadline_tree::{ForestStats, Node, NodeId, TreeId};

use super::Report;
use crate::config::DeletePolicy;

fn parent_cell(node: &Node) -> String {
    node.parent_id()
        .map_or_else(|| "-".to_owned(), |parent| parent.to_string())
}

/// Renders comments in thread order, indenting each body by its depth
/// relative to the shallowest comment shown.
fn thread_table(comments: &[Node]) -> Table {
    let base = comments.iter().map(Node::depth).min().unwrap_or_default();

    let mut table = Table::new();
    let _ = table.set_header(vec![
        Cell::new("ID").fg(Color::Blue),
        Cell::new("Parent").fg(Color::Blue),
        Cell::new("Depth").fg(Color::Blue),
        Cell::new("Author").fg(Color::Blue),
        Cell::new("Comment").fg(Color::Blue),
    ]);

    for node in comments {
        let level = usize::try_from(node.depth().saturating_sub(base)).unwrap_or_default();
        let indent = "  ".repeat(level);
        let _ = table.add_row(vec![
            node.id().to_string(),
            parent_cell(node),
            node.depth().to_string(),
            node.payload().author.clone(),
            format!("{indent}{}", node.payload().body),
        ]);
    }

    table
}

impl Report for Node {
    fn report(&self) {
        let mut table = Table::new();
        let _ = table.set_header(vec![
            Cell::new("Comment").fg(Color::Green),
            Cell::new("Value").fg(Color::Blue),
        ]);
        let _ = table.add_row(vec!["ID".to_owned(), self.id().to_string()]);
        let _ = table.add_row(vec!["Post".to_owned(), self.post_id().to_string()]);
        let parent = if self.is_root() {
            "top level".to_owned()
        } else {
            parent_cell(self)
        };
        let _ = table.add_row(vec!["Parent".to_owned(), parent]);
        let _ = table.add_row(vec!["Depth".to_owned(), self.depth().to_string()]);
        let _ = table.add_row(vec![
            "Boundaries".to_owned(),
            format!("{}..{}", self.left(), self.right()),
        ]);
        let replies = if self.is_leaf() {
            "none".to_owned()
        } else {
            self.descendant_count().to_string()
        };
        let _ = table.add_row(vec!["Replies".to_owned(), replies]);
        let _ = table.add_row(vec!["Author".to_owned(), self.payload().author.clone()]);
        let _ = table.add_row(vec!["Body".to_owned(), self.payload().body.clone()]);
        println!("{table}");
    }
}

#[derive(Debug, Serialize)]
pub struct CommentList {
    pub comments: Vec<Node>,
}

impl Report for CommentList {
    fn report(&self) {
        if self.comments.is_empty() {
            println!("No comments found");
            return;
        }

        println!("{}", thread_table(&self.comments));
    }
}

/// A comment together with the chain of comments it replies to.
#[derive(Debug, Serialize)]
pub struct CommentChain {
    pub comment: Node,
    pub ancestors: Vec<Node>,
}

impl Report for CommentChain {
    fn report(&self) {
        self.comment.report();

        if !self.ancestors.is_empty() {
            println!("In reply to:");
            println!("{}", thread_table(&self.ancestors));
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub comment: NodeId,
    pub policy: DeletePolicy,
    pub removed: usize,
}

impl Report for Deleted {
    fn report(&self) {
        let mut table = Table::new();
        let _ = table.set_header(vec![Cell::new("Comment Deleted").fg(Color::Green)]);
        let _ = table.add_row(vec![format!(
            "Deleted comment {} ({:?}), {} comment(s) removed",
            self.comment, self.policy, self.removed
        )]);
        println!("{table}");
    }
}

#[derive(Debug, Serialize)]
pub struct Verified {
    pub trees: usize,
}

impl Report for Verified {
    fn report(&self) {
        let mut table = Table::new();
        let _ = table.set_header(vec![Cell::new("Forest Verified").fg(Color::Green)]);
        let _ = table.add_row(vec![format!("{} tree(s) are consistent", self.trees)]);
        println!("{table}");
    }
}

#[derive(Debug, Serialize)]
pub struct Rebuilt {
    pub post: TreeId,
    pub comments: usize,
}

impl Report for Rebuilt {
    fn report(&self) {
        let mut table = Table::new();
        let _ = table.set_header(vec![Cell::new("Tree Rebuilt").fg(Color::Green)]);
        let _ = table.add_row(vec![format!(
            "Recomputed {} comment(s) on post {}",
            self.comments, self.post
        )]);
        println!("{table}");
    }
}

impl Report for ForestStats {
    fn report(&self) {
        let mut table = Table::new();
        let _ = table.set_header(vec![
            Cell::new("Trees").fg(Color::Blue),
            Cell::new("Comments").fg(Color::Blue),
            Cell::new("Max Depth").fg(Color::Blue),
        ]);
        let _ = table.add_row(vec![
            self.tree_count.to_string(),
            self.node_count.to_string(),
            self.max_depth
                .map_or_else(|| "-".to_owned(), |depth| depth.to_string()),
        ]);
        println!("{table}");
    }
}
