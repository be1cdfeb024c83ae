use crate::areas::repository::Repository;
use anyhow::Context;
use std::io::Write;

impl Repository {
    pub fn ls_tree(&mut self, object: &str) -> anyhow::Result<()> {
        let object_id = self.database().resolve_prefix(object)?;
        let tree = self
            .database()
            .parse_object_as_tree(&object_id)?
            .with_context(|| format!("object {} is not a tree", object_id))?;

        for (name, _) in tree.entries() {
            writeln!(self.writer(), "{}", name)?;
        }

        Ok(())
    }
}
