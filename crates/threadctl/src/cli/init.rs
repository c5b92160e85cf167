use std::fs::create_dir_all;

use clap::Parser;
use eyre::{bail, Result as EyreResult, WrapErr};
use threadline_tree::Forest;
use tracing::{info, warn};

use super::Environment;
use crate::config::ConfigFile;
use crate::output::InfoLine;
use crate::state::{self, StateLock};

/// Initialize configuration and an empty forest
#[derive(Debug, Parser)]
pub struct InitCommand {
    /// Check every structural change against the tree invariants
    #[arg(long)]
    pub verify_mutations: bool,

    /// Force initialization even if the directory already holds a forest
    #[arg(long, short)]
    pub force: bool,
}

impl InitCommand {
    pub fn run(self, environment: &Environment) -> EyreResult<()> {
        let home = environment.home();

        if !home.exists() {
            create_dir_all(home)
                .wrap_err_with(|| format!("failed to create directory {home:?}"))?;
        }

        let _lock = StateLock::exclusive(home)?;

        if ConfigFile::exists(home) || state::exists(home) {
            if let Err(err) = ConfigFile::load(home) {
                if self.force {
                    warn!(%err, "Failed to load existing configuration, overwriting");
                } else {
                    bail!("Failed to load existing configuration: {err}");
                }
            }
            if !self.force {
                bail!("Forest is already initialized in {home:?}");
            }
        }

        let mut config = ConfigFile::default();
        config.forest.verify_mutations = self.verify_mutations;

        let forest = Forest::new(config.forest);

        config.save(home)?;
        state::save(home, &forest)?;

        info!(
            %home,
            verify_mutations = forest.config().verify_mutations,
            "Initialized comment forest"
        );
        environment
            .output
            .write(&InfoLine(&format!("Initialized comment forest in {home}")));

        Ok(())
    }
}
