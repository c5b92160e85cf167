use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use eyre::{Result as EyreResult, WrapErr};
use threadline_tree::{NodeId, Payload, TreeId};

use super::Environment;

/// Post a comment, either at the top of a post or as a reply
#[derive(Debug, Parser)]
pub struct CommentCommand {
    /// Post the comment belongs to
    #[arg(long, value_name = "POST")]
    pub post: TreeId,

    /// Comment being replied to
    #[arg(long, value_name = "COMMENT")]
    pub parent: Option<NodeId>,

    /// Place the comment among its siblings by creation time instead of last
    #[arg(long)]
    pub ordered: bool,

    /// Name shown next to the comment
    #[arg(long, value_name = "NAME")]
    pub author: String,

    /// Comment text
    #[arg(value_name = "BODY")]
    pub body: String,
}

impl CommentCommand {
    pub fn run(self, environment: &Environment) -> EyreResult<()> {
        let session = environment.write()?;

        let payload = Payload::new(self.author, self.body, now_millis()?);
        let id = if self.ordered {
            session
                .forest
                .insert_child_ordered(self.parent, self.post, payload)
        } else {
            session.forest.append_child(self.parent, self.post, payload)
        }?;

        session.persist()?;
        environment.output.write(&session.forest.get(id)?);

        Ok(())
    }
}

fn now_millis() -> EyreResult<u64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .wrap_err("system clock is set before the Unix epoch")?;

    u64::try_from(elapsed.as_millis()).wrap_err("system clock is out of range")
}
