use std::fs::{read_to_string, write};

use camino::Utf8Path;
use clap::ValueEnum;
use eyre::{Result as EyreResult, WrapErr};
use serde::{Deserialize, Serialize};
use threadline_tree::ForestConfig;

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
#[non_exhaustive]
pub struct ConfigFile {
    #[serde(default)]
    pub forest: ForestConfig,

    #[serde(default)]
    pub listing: ListingConfig,

    #[serde(default)]
    pub delete: DeleteConfig,
}

/// How deep listings go when the command line doesn't say.
#[derive(Copy, Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[non_exhaustive]
pub struct ListingConfig {
    /// Deepest level shown by `list`, counted from the top-level comments.
    #[serde(default = "default_post_depth")]
    pub post_depth: u32,

    /// Levels below the selected comment shown by `replies`.
    #[serde(default = "default_reply_depth")]
    pub reply_depth: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            post_depth: default_post_depth(),
            reply_depth: default_reply_depth(),
        }
    }
}

const fn default_post_depth() -> u32 {
    2
}

const fn default_reply_depth() -> u32 {
    3
}

#[derive(Copy, Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
#[non_exhaustive]
pub struct DeleteConfig {
    #[serde(default)]
    pub policy: DeletePolicy,
}

/// What happens to the replies of a deleted comment.
#[derive(Copy, Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DeletePolicy {
    /// Remove the comment together with every reply below it.
    #[default]
    Cascade,
    /// Remove only the comment; its replies move up one level.
    Reparent,
}

impl ConfigFile {
    pub fn exists(dir: &Utf8Path) -> bool {
        dir.join(CONFIG_FILE).is_file()
    }

    pub fn load(dir: &Utf8Path) -> EyreResult<Self> {
        let path = dir.join(CONFIG_FILE);
        let content = read_to_string(&path)
            .wrap_err_with(|| format!("failed to read configuration from {path:?}"))?;

        toml::from_str(&content)
            .wrap_err_with(|| format!("failed to parse configuration in {path:?}"))
    }

    pub fn save(&self, dir: &Utf8Path) -> EyreResult<()> {
        let path = dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self)?;

        write(&path, content)
            .wrap_err_with(|| format!("failed to write configuration to {path:?}"))?;

        Ok(())
    }
}
