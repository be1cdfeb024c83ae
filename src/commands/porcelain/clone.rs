use crate::areas::remote::Remote;
use crate::areas::repository::Repository;
use crate::artifacts::pack::unpack;
use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Clone a smart-HTTP remote into a new directory
    ///
    /// Discovery and negotiation happen before anything touches the disk;
    /// a failure after the target directory exists leaves the partial clone
    /// behind for the user to inspect or remove.
    pub fn clone_from(
        url: &str,
        directory: &Path,
        writer: Box<dyn std::io::Write>,
    ) -> anyhow::Result<()> {
        let remote = Remote::new(url)?;
        let advertisement = remote.discover()?;
        let pack = remote.fetch_pack(&advertisement.head_oid)?;

        fs::create_dir(directory).with_context(|| {
            format!("failed to create target directory {}", directory.display())
        })?;
        let mut repository = Repository::new(directory.to_path_buf(), writer)?;
        repository.init_repository(false)?;

        unpack::unpack_into(repository.database(), &pack)
            .with_context(|| format!("failed to ingest pack from {}", remote.url()))?;

        let branch_name = advertisement.short_branch_name();
        repository
            .refs()
            .create_branch(branch_name, &advertisement.head_oid)?;
        repository.checkout(branch_name)?;

        writeln!(
            repository.writer(),
            "Cloned {} into {}",
            remote.url(),
            directory.display()
        )?;

        Ok(())
    }

    /// Point HEAD at a branch and materialize its commit's tree into the
    /// working directory
    pub(crate) fn checkout(&mut self, branch_name: &str) -> anyhow::Result<()> {
        let commit_oid = self
            .refs()
            .read_ref(branch_name)?
            .with_context(|| format!("branch {} not found", branch_name))?;

        self.refs().set_head_symbolic(branch_name)?;

        let commit = self
            .database()
            .parse_object_as_commit(&commit_oid)?
            .with_context(|| format!("object {} is not a commit", commit_oid))?;

        self.workspace()
            .materialize_tree(self.database(), commit.tree_oid(), Path::new(""))
    }
}
