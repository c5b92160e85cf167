use clap::Parser;
use eyre::Result as EyreResult;
use threadline_tree::{Forest, Node, NodeId};

use super::Environment;
use crate::config::ConfigFile;
use crate::output::CommentList;

/// List the replies below a comment
#[derive(Debug, Parser)]
pub struct RepliesCommand {
    /// Comment whose replies to show
    #[arg(value_name = "COMMENT")]
    pub comment: NodeId,

    /// Levels to descend [default: `listing.reply_depth` from config]
    #[arg(long, value_name = "LEVELS")]
    pub depth: Option<u32>,

    /// Include the comment itself as the first entry
    #[arg(long)]
    pub include_root: bool,
}

impl RepliesCommand {
    pub fn run(self, environment: &Environment) -> EyreResult<()> {
        let session = environment.read()?;

        let comments = self.select(&session.config, &session.forest)?;

        environment.output.write(&CommentList { comments });

        Ok(())
    }

    pub fn select(&self, config: &ConfigFile, forest: &Forest) -> EyreResult<Vec<Node>> {
        let depth = self.depth.unwrap_or(config.listing.reply_depth);

        Ok(forest.subtree(self.comment, Some(depth), self.include_root)?)
    }
}
