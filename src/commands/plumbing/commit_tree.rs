use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_type::ObjectType;
use std::io::Write;

impl Repository {
    pub fn commit_tree(
        &mut self,
        tree: &str,
        parent: Option<&str>,
        message: &str,
    ) -> anyhow::Result<()> {
        let tree_oid = self.database().resolve_prefix(tree)?;
        anyhow::ensure!(
            self.database().object_type_of(&tree_oid)? == ObjectType::Tree,
            "object {} is not a tree",
            tree_oid
        );

        let parents = match parent {
            Some(parent) => vec![self.database().resolve_prefix(parent)?],
            None => Vec::new(),
        };

        let mut message = message.to_string();
        if !message.ends_with('\n') {
            message.push('\n');
        }

        let commit = Commit::new(parents, tree_oid, Author::from_env(), message);
        let commit_id = self.database().store(&commit)?;

        writeln!(self.writer(), "{}", commit_id)?;

        Ok(())
    }
}
