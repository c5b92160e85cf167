use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Color, Table};
use const_format::concatcp;
use eyre::{bail, ensure, Report as EyreReport, Result as EyreResult};
use serde::{Serialize, Serializer};
use thiserror::Error as ThisError;
use threadline_tree::{Forest, TreeError};

use crate::config::ConfigFile;
use crate::output::{Format, Output, Report};
use crate::state::StateLock;
use crate::{defaults, state};

mod comment;
mod delete;
mod init;
mod list;
mod rebuild;
mod replies;
mod show;
mod stats;
mod verify;

use comment::CommentCommand;
use delete::DeleteCommand;
use init::InitCommand;
use list::ListCommand;
use rebuild::RebuildCommand;
use replies::RepliesCommand;
use show::ShowCommand;
use stats::StatsCommand;
use verify::VerifyCommand;

#[cfg(test)]
#[path = "tests/cli.rs"]
mod tests;

pub const EXAMPLES: &str = r"
  # Initialize a new forest
  $ threadctl --home data/ init

  # Start a thread on post 7, then reply to it
  $ threadctl comment --post 7 --author ann 'First!'
  $ threadctl comment --post 7 --parent 1 --author bob 'Welcome'

  # Show the thread, two levels deep
  $ threadctl list --post 7

  # Remove a comment but keep its replies
  $ threadctl delete 1 --policy reparent
";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(after_help = concatcp!(
    "Environment variables:\n",
    "  THREADLINE_HOME    Directory for config and state\n",
    "  RUST_LOG           Log filter directives\n\n",
    "Examples:",
    EXAMPLES
))]
pub struct RootCommand {
    #[command(flatten)]
    pub args: RootArgs,

    #[command(subcommand)]
    pub action: SubCommands,
}

#[derive(Debug, Subcommand)]
pub enum SubCommands {
    Init(InitCommand),
    #[command(alias = "reply")]
    Comment(CommentCommand),
    #[command(alias = "rm")]
    Delete(DeleteCommand),
    #[command(alias = "ls")]
    List(ListCommand),
    Replies(RepliesCommand),
    Show(ShowCommand),
    Verify(VerifyCommand),
    Rebuild(RebuildCommand),
    Stats(StatsCommand),
}

#[derive(Debug, Parser)]
pub struct RootArgs {
    /// Directory for config and state
    #[arg(long, value_name = "PATH", default_value_t = defaults::default_home_dir())]
    #[arg(env = "THREADLINE_HOME", hide_env_values = true)]
    pub home: Utf8PathBuf,

    #[arg(long, value_name = "FORMAT", default_value_t, value_enum)]
    pub output: Format,
}

#[derive(Debug)]
pub struct Environment {
    pub output: Output,
    home: Utf8PathBuf,
}

impl Environment {
    pub const fn new(output: Output, home: Utf8PathBuf) -> Self {
        Self { output, home }
    }

    pub fn home(&self) -> &Utf8Path {
        &self.home
    }

    pub fn config(&self) -> EyreResult<ConfigFile> {
        if !ConfigFile::exists(&self.home) {
            bail!(
                "No forest initialized in {:?}: run `threadctl init` first",
                self.home
            );
        }

        ConfigFile::load(&self.home)
    }

    /// Loads the configuration and the forest for queries. Writers are kept
    /// out until the session is dropped.
    pub fn read(&self) -> EyreResult<Session<'_>> {
        self.session(false)
    }

    /// Loads the configuration and the forest for a structural change. Every
    /// other invocation on this home waits until the session is dropped, so
    /// nothing saved in between is overwritten.
    pub fn write(&self) -> EyreResult<Session<'_>> {
        self.session(true)
    }

    fn session(&self, exclusive: bool) -> EyreResult<Session<'_>> {
        let config = self.config()?;
        let lock = if exclusive {
            StateLock::exclusive(&self.home)?
        } else {
            StateLock::shared(&self.home)?
        };
        let forest = state::load(&self.home, config.forest)?;

        Ok(Session {
            config,
            forest,
            home: &self.home,
            lock,
        })
    }
}

/// A loaded forest together with the lock that keeps it current.
#[derive(Debug)]
pub struct Session<'a> {
    pub config: ConfigFile,
    pub forest: Forest,
    home: &'a Utf8Path,
    lock: StateLock,
}

impl Session<'_> {
    pub fn persist(&self) -> EyreResult<()> {
        ensure!(
            self.lock.is_exclusive(),
            "state in {:?} was opened read-only",
            self.home
        );

        state::save(self.home, &self.forest)
    }
}

impl RootCommand {
    pub fn run(self) -> Result<(), CliError> {
        let environment = Environment::new(Output::new(self.args.output), self.args.home);

        let result = match self.action {
            SubCommands::Init(init) => init.run(&environment),
            SubCommands::Comment(comment) => comment.run(&environment),
            SubCommands::Delete(delete) => delete.run(&environment),
            SubCommands::List(list) => list.run(&environment),
            SubCommands::Replies(replies) => replies.run(&environment),
            SubCommands::Show(show) => show.run(&environment),
            SubCommands::Verify(verify) => verify.run(&environment),
            SubCommands::Rebuild(rebuild) => rebuild.run(&environment),
            SubCommands::Stats(stats) => stats.run(&environment),
        };

        if let Err(err) = result {
            let err = CliError::from_report(err);
            environment.output.write(&err);
            return Err(err);
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, ThisError)]
pub enum CliError {
    #[error(transparent)]
    Tree(
        #[serde(serialize_with = "serialize_display")]
        TreeError,
    ),

    #[error(transparent)]
    Other(
        #[from]
        #[serde(serialize_with = "serialize_eyre_report")]
        EyreReport,
    ),
}

impl CliError {
    /// Surfaces an engine rejection even when I/O context was wrapped around it.
    fn from_report(report: EyreReport) -> Self {
        match report.downcast_ref::<TreeError>() {
            Some(err) => Self::Tree(err.clone()),
            None => Self::Other(report),
        }
    }
}

impl From<CliError> for ExitCode {
    fn from(error: CliError) -> Self {
        match error {
            CliError::Tree(_) => Self::from(101),
            CliError::Other(_) => Self::FAILURE,
        }
    }
}

impl Report for CliError {
    fn report(&self) {
        let mut table = Table::new();
        let _ = table.set_header(vec![Cell::new("ERROR").fg(Color::Red)]);
        let _ = table.add_row(vec![match self {
            Self::Tree(err) => format!("Rejected: {err}"),
            Self::Other(err) => format!("Error: {err:?}"),
        }]);
        println!("{table}");
    }
}

fn serialize_display<S>(error: &TreeError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(error)
}

fn serialize_eyre_report<S>(report: &EyreReport, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(report.chain().map(ToString::to_string))
}
