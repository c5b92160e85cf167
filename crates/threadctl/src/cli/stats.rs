use clap::Parser;
use eyre::Result as EyreResult;

use super::Environment;

/// Show forest-wide counters
#[derive(Copy, Clone, Debug, Parser)]
pub struct StatsCommand;

impl StatsCommand {
    pub fn run(self, environment: &Environment) -> EyreResult<()> {
        let session = environment.read()?;

        environment.output.write(&session.forest.stats());

        Ok(())
    }
}
