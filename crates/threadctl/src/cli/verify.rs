use clap::Parser;
use eyre::Result as EyreResult;

use super::Environment;
use crate::output::Verified;

/// Check every tree against the nested-set invariants
#[derive(Copy, Clone, Debug, Parser)]
pub struct VerifyCommand;

impl VerifyCommand {
    pub fn run(self, environment: &Environment) -> EyreResult<()> {
        let session = environment.read()?;

        session.forest.verify()?;

        environment.output.write(&Verified {
            trees: session.forest.trees().len(),
        });

        Ok(())
    }
}
