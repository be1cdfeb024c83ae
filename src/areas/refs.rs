//! References (branches and HEAD)
//!
//! References are human-readable names pointing to commits. They are stored
//! as text files containing either:
//! - A 40-character SHA-1 hash followed by a newline (direct reference)
//! - `ref: <path>` for symbolic references (HEAD pointing at a branch)
//!
//! HEAD is written symbolically by init and checkout, but a detached
//! (bare-hash) HEAD written by other tools is tolerated when reading.

use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::Path;

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Reference manager rooted at the `.git` directory
#[derive(Debug, new)]
pub struct Refs {
    /// Path to the git directory (typically `.git`)
    path: Box<Path>,
}

/// Internal representation of a reference value
#[derive(Debug, Clone)]
enum SymRefOrOid {
    /// Symbolic reference pointing to another ref
    SymRef { target: String },
    /// Direct object ID
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read_symref_or_oid(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        if let Some(symref_match) = symref_match {
            Ok(Some(SymRefOrOid::SymRef {
                target: symref_match[1].to_string(),
            }))
        } else {
            Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(
                content.to_string(),
            )?)))
        }
    }
}

impl Refs {
    /// Create or overwrite a branch ref pointing at a commit
    pub fn create_branch(&self, branch_name: &str, oid: &ObjectId) -> anyhow::Result<()> {
        let branch_path = self.heads_path().join(branch_name).into_boxed_path();

        self.update_ref_file(branch_path, format!("{}\n", oid))
    }

    /// Point HEAD at a branch symbolically
    pub fn set_head_symbolic(&self, branch_name: &str) -> anyhow::Result<()> {
        self.update_ref_file(
            self.head_path(),
            format!("ref: refs/heads/{}\n", branch_name),
        )
    }

    /// Read the commit a branch points at, following symbolic indirection
    pub fn read_ref(&self, branch_name: &str) -> anyhow::Result<Option<ObjectId>> {
        self.read_symref(&self.heads_path().join(branch_name))
    }

    /// Read the commit HEAD points at, following symbolic indirection
    ///
    /// Returns `None` for an unborn branch; a detached HEAD reads as the
    /// bare hash it contains.
    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.read_symref(&self.head_path())
    }

    /// Read a reference file, following symbolic references recursively
    fn read_symref(&self, path: &Path) -> anyhow::Result<Option<ObjectId>> {
        let ref_content = SymRefOrOid::read_symref_or_oid(path)?;

        match ref_content {
            Some(SymRefOrOid::SymRef { target }) => {
                self.read_symref(self.path.join(target).as_path())
            }
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            None => Ok(None),
        }
    }

    fn update_ref_file(&self, path: Box<Path>, raw_ref: String) -> anyhow::Result<()> {
        // create all the parent directories if they don't exist
        std::fs::create_dir_all(path.parent().with_context(|| {
            format!(
                "failed to create parent directories for ref file at {:?}",
                path
            )
        })?)?;

        // open the ref file as WRONLY and CREAT to write the ref to it
        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.clone())
            .with_context(|| format!("failed to open ref file at {:?}", path))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(raw_ref.as_bytes())?;

        Ok(())
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join("HEAD").into_boxed_path()
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.refs_path().join("heads").into_boxed_path()
    }
}
