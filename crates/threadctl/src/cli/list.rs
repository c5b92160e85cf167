use clap::Parser;
use eyre::Result as EyreResult;
use threadline_tree::{Forest, Node, TreeId};

use super::Environment;
use crate::config::ConfigFile;
use crate::output::CommentList;

/// List the comments on a post in thread order
#[derive(Debug, Parser)]
pub struct ListCommand {
    /// Post to list
    #[arg(long, value_name = "POST")]
    pub post: TreeId,

    /// Show every level instead of stopping at `listing.post_depth`
    #[arg(long)]
    pub all: bool,
}

impl ListCommand {
    pub fn run(self, environment: &Environment) -> EyreResult<()> {
        let session = environment.read()?;

        let comments = self.select(&session.config, &session.forest);

        environment.output.write(&CommentList { comments });

        Ok(())
    }

    pub fn select(&self, config: &ConfigFile, forest: &Forest) -> Vec<Node> {
        let max_depth = (!self.all).then_some(config.listing.post_depth);

        forest.tree_listing_to_depth(self.post, max_depth)
    }
}
