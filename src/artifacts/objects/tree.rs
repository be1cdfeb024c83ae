//! Tree object
//!
//! Trees represent directory snapshots. Each entry names a blob (file) or
//! another tree (subdirectory).
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`, entries concatenated with no
//! separators. Each entry: `<mode> <name>\0<20-byte-sha1>`.
//!
//! ## Entry ordering
//!
//! Entries must be sorted byte-wise by name, except that subdirectory names
//! compare as if suffixed by `/`. The entry map keys directories with a
//! trailing `/` so the BTreeMap order is exactly the serialized order; the
//! slash is trimmed on serialization and restored from the mode on
//! deserialization.

use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// A single tree entry: a mode and the object it points at
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub oid: ObjectId,
}

/// Tree object representing a directory snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    /// Entries keyed by name, directories carrying a trailing `/`
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Add a regular-file entry
    pub fn add_file(&mut self, name: &str, oid: ObjectId) {
        self.entries
            .insert(name.to_string(), TreeEntry::new(EntryMode::Regular, oid));
    }

    /// Add a subdirectory entry
    pub fn add_directory(&mut self, name: &str, oid: ObjectId) {
        self.entries
            .insert(format!("{}/", name), TreeEntry::new(EntryMode::Directory, oid));
    }

    /// Iterate entries in stored order, names without the internal `/` suffix
    pub fn entries(&self) -> impl Iterator<Item = (&str, &TreeEntry)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.trim_end_matches('/'), entry))
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();
        for (name, entry) in self.entries() {
            let header = format!("{} {}", entry.mode, name);
            content_bytes.write_all(header.as_bytes())?;
            content_bytes.push(0);
            entry.oid.write_h40_to(&mut content_bytes)?;
        }

        let mut tree_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        tree_bytes.write_all(header.as_bytes())?;
        tree_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(tree_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();
        let mut reader = reader;

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            // Read "mode " (space-delimited)
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(anyhow::anyhow!("unexpected EOF in tree entry mode"));
            }

            let mode_str = std::str::from_utf8(&mode_bytes)?;
            let mode = EntryMode::from_octal_str(mode_str)?;

            // Read "name\0"
            name_bytes.clear();
            let n = reader.read_until(b'\0', &mut name_bytes)?;
            if n == 0 || name_bytes.pop() != Some(b'\0') {
                return Err(anyhow::anyhow!("unexpected EOF in tree entry name"));
            }
            let name = std::str::from_utf8(&name_bytes)?.to_owned();

            // Read the raw object id
            let oid = ObjectId::read_h40_from(&mut reader)
                .context("unexpected EOF in tree entry object id")?;

            let key = if mode.is_tree() {
                format!("{}/", name)
            } else {
                name
            };
            entries.insert(key, TreeEntry::new(mode, oid));
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }
}
