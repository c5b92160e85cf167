use clap::Parser;
use eyre::Result as EyreResult;
use threadline_tree::TreeId;

use super::Environment;
use crate::output::Rebuilt;

/// Recompute a post's boundaries from its reply links
#[derive(Debug, Parser)]
pub struct RebuildCommand {
    #[arg(long, value_name = "POST")]
    pub post: TreeId,
}

impl RebuildCommand {
    pub fn run(self, environment: &Environment) -> EyreResult<()> {
        let session = environment.write()?;

        let comments = session.forest.rebuild_tree(self.post)?;

        session.persist()?;
        environment.output.write(&Rebuilt {
            post: self.post,
            comments,
        });

        Ok(())
    }
}
