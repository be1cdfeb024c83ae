//! Working-tree projection
//!
//! The workspace maps the object database onto the working directory in both
//! directions: a recursive snapshot hashes every file and subdirectory into
//! blobs and trees, and materialization writes a stored tree back out as
//! files and subdirectories. The `.git` directory is never part of either
//! projection.

use crate::areas::database::Database;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::path::Path;

const GIT_DIR_NAME: &str = ".git";

#[derive(Debug, new)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Bytes> {
        let file_path = self.path.join(file_path);

        let content = std::fs::read(&file_path)
            .with_context(|| format!("failed to read file {}", file_path.display()))?;

        Ok(Bytes::from(content))
    }

    /// Hash the working directory into a tree object, storing every blob and
    /// tree along the way, and return the root tree ID
    pub fn snapshot(&self, database: &Database) -> anyhow::Result<ObjectId> {
        self.snapshot_directory(database, &self.path)
    }

    fn snapshot_directory(&self, database: &Database, dir_path: &Path) -> anyhow::Result<ObjectId> {
        let mut tree = Tree::default();

        let entries = std::fs::read_dir(dir_path)
            .with_context(|| format!("failed to list directory {}", dir_path.display()))?;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name
                .to_str()
                .with_context(|| format!("non-utf8 file name in {}", dir_path.display()))?;
            if name == GIT_DIR_NAME {
                continue;
            }

            if entry.file_type()?.is_dir() {
                let oid = self.snapshot_directory(database, &entry.path())?;
                tree.add_directory(name, oid);
            } else {
                let content = std::fs::read(entry.path())
                    .with_context(|| format!("failed to read file {}", entry.path().display()))?;
                let oid = database.store(&Blob::new(Bytes::from(content)))?;
                tree.add_file(name, oid);
            }
        }

        database.store(&tree)
    }

    /// Write a stored tree out below `dir_path` (relative to the workspace),
    /// creating subdirectories as the recursion descends
    pub fn materialize_tree(
        &self,
        database: &Database,
        tree_oid: &ObjectId,
        dir_path: &Path,
    ) -> anyhow::Result<()> {
        let tree = database
            .parse_object_as_tree(tree_oid)?
            .with_context(|| format!("object {} is not a tree", tree_oid))?;

        for (name, entry) in tree.entries() {
            let entry_path = dir_path.join(name);

            if entry.mode.is_tree() {
                std::fs::create_dir_all(self.path.join(&entry_path)).with_context(|| {
                    format!("failed to create directory {}", entry_path.display())
                })?;
                self.materialize_tree(database, &entry.oid, &entry_path)?;
            } else {
                let (object_type, payload) = database.load_payload(&entry.oid)?;
                anyhow::ensure!(
                    object_type == ObjectType::Blob,
                    "tree entry {} points at a {}, expected a blob",
                    entry_path.display(),
                    object_type
                );
                std::fs::write(self.path.join(&entry_path), &payload)
                    .with_context(|| format!("failed to write file {}", entry_path.display()))?;
            }
        }

        Ok(())
    }
}
