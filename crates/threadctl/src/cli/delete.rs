use clap::Parser;
use eyre::Result as EyreResult;
use threadline_tree::NodeId;

use super::Environment;
use crate::config::DeletePolicy;
use crate::output::Deleted;

/// Delete a comment
#[derive(Debug, Parser)]
pub struct DeleteCommand {
    /// Comment to delete
    #[arg(value_name = "COMMENT")]
    pub comment: NodeId,

    /// What happens to its replies [default: from config]
    #[arg(long, value_enum)]
    pub policy: Option<DeletePolicy>,
}

impl DeleteCommand {
    pub fn run(self, environment: &Environment) -> EyreResult<()> {
        let session = environment.write()?;
        let policy = self.policy.unwrap_or(session.config.delete.policy);

        let removed = match policy {
            DeletePolicy::Cascade => session.forest.delete_subtree(self.comment)?,
            DeletePolicy::Reparent => session
                .forest
                .delete_node_reparent_children(self.comment)?,
        };

        session.persist()?;
        environment.output.write(&Deleted {
            comment: self.comment,
            policy,
            removed,
        });

        Ok(())
    }
}
