use clap::Parser;
use eyre::Result as EyreResult;
use threadline_tree::NodeId;

use super::Environment;
use crate::output::CommentChain;

/// Show a comment and the comments it replies to
#[derive(Debug, Parser)]
pub struct ShowCommand {
    #[arg(value_name = "COMMENT")]
    pub comment: NodeId,
}

impl ShowCommand {
    pub fn run(self, environment: &Environment) -> EyreResult<()> {
        let session = environment.read()?;

        let comment = session.forest.get(self.comment)?;
        let ancestors = session.forest.ancestors(self.comment, false)?;

        environment
            .output
            .write(&CommentChain { comment, ancestors });

        Ok(())
    }
}
