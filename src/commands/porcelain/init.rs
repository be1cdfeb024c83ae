use crate::areas::repository::Repository;
use anyhow::Context;
use std::fs;
use std::io::Write;

/// Branch HEAD points at after `init`
pub const DEFAULT_BRANCH: &str = "master";

impl Repository {
    pub fn init(&mut self) -> anyhow::Result<()> {
        self.init_repository(true)?;

        writeln!(self.writer(), "Initialized git directory")?;

        Ok(())
    }

    /// Create the `.git` scaffolding
    ///
    /// Clone initializes without a default branch: HEAD is only written
    /// once the remote's branch name is known.
    pub(crate) fn init_repository(&self, create_default_branch: bool) -> anyhow::Result<()> {
        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .git/objects directory")?;

        fs::create_dir_all(self.refs().refs_path())
            .context("Failed to create .git/refs directory")?;

        if create_default_branch {
            self.refs().set_head_symbolic(DEFAULT_BRANCH)?;
        }

        Ok(())
    }
}
