use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    pub fn write_tree(&mut self) -> anyhow::Result<()> {
        let tree_id = self.workspace().snapshot(self.database())?;

        writeln!(self.writer(), "{}", tree_id)?;

        Ok(())
    }
}
