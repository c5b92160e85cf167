//! The forest as persisted between invocations.
//!
//! State is a JSON-encoded [`ForestSnapshot`]. Saving writes a uniquely named
//! temporary file in the same directory, syncs it to disk and renames it over
//! the previous state, so a crash never leaves a half-written state behind.
//!
//! Invocations sharing a home directory coordinate through [`StateLock`]:
//! writers hold it exclusively from load to save, readers hold it shared.

use std::fs::{read_to_string, File, OpenOptions};
use std::io::Write;

use camino::Utf8Path;
use eyre::{Result as EyreResult, WrapErr};
use tempfile::NamedTempFile;
use threadline_tree::{Forest, ForestConfig, ForestSnapshot};
use tracing::debug;

#[cfg(test)]
#[path = "tests/state.rs"]
mod tests;

pub const STATE_FILE: &str = "forest.json";
pub const LOCK_FILE: &str = "forest.lock";

/// Advisory lock over the state of one home directory. Released on drop.
#[derive(Debug)]
pub struct StateLock {
    file: File,
    exclusive: bool,
}

impl StateLock {
    /// Blocks until no other invocation holds the lock in any mode.
    pub fn exclusive(dir: &Utf8Path) -> EyreResult<Self> {
        let file = open_lock_file(dir)?;
        file.lock()
            .wrap_err_with(|| format!("failed to lock state in {dir:?}"))?;

        Ok(Self {
            file,
            exclusive: true,
        })
    }

    /// Blocks until no other invocation holds the lock exclusively.
    pub fn shared(dir: &Utf8Path) -> EyreResult<Self> {
        let file = open_lock_file(dir)?;
        file.lock_shared()
            .wrap_err_with(|| format!("failed to lock state in {dir:?}"))?;

        Ok(Self {
            file,
            exclusive: false,
        })
    }

    pub const fn is_exclusive(&self) -> bool {
        self.exclusive
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            debug!(%err, "Failed to release state lock");
        }
    }
}

fn open_lock_file(dir: &Utf8Path) -> EyreResult<File> {
    let path = dir.join(LOCK_FILE);

    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .wrap_err_with(|| format!("failed to open lock file {path:?}"))
}

pub fn exists(dir: &Utf8Path) -> bool {
    dir.join(STATE_FILE).is_file()
}

pub fn load(dir: &Utf8Path, config: ForestConfig) -> EyreResult<Forest> {
    let path = dir.join(STATE_FILE);
    let content =
        read_to_string(&path).wrap_err_with(|| format!("failed to read state from {path:?}"))?;

    let snapshot: ForestSnapshot = serde_json::from_str(&content)
        .wrap_err_with(|| format!("failed to parse state in {path:?}"))?;

    Forest::restore(snapshot, config)
        .wrap_err_with(|| format!("state in {path:?} is not a consistent forest"))
}

pub fn save(dir: &Utf8Path, forest: &Forest) -> EyreResult<()> {
    let path = dir.join(STATE_FILE);

    let snapshot = forest.snapshot();
    let content = serde_json::to_vec_pretty(&snapshot)?;

    let mut scratch = NamedTempFile::new_in(dir)
        .wrap_err_with(|| format!("failed to create a temporary state file in {dir:?}"))?;
    scratch
        .write_all(&content)
        .wrap_err("failed to write temporary state file")?;
    scratch
        .as_file()
        .sync_all()
        .wrap_err("failed to sync temporary state file")?;
    let _file = scratch
        .persist(&path)
        .wrap_err_with(|| format!("failed to move state into place at {path:?}"))?;

    debug!(%path, comments = snapshot.nodes().len(), "Saved forest state");

    Ok(())
}
