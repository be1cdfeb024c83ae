//! Object database
//!
//! The database stores all objects (blobs, trees, commits, tags) using
//! content-addressable storage. Objects are identified by the SHA-1 hash of
//! their canonical serialization and stored in a directory structure based
//! on the hash prefix for efficient lookup.
//!
//! ## Storage Format
//!
//! Objects are stored as:
//! - Path: `.git/objects/ab/cdef123...` (first 2 chars as directory, rest as filename)
//! - Content: Compressed (zlib) format containing type, size, and data
//!
//! Objects are immutable: a write to an existing path is a no-op, so
//! duplicate stores are idempotent by construction.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Context;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::{BufRead, Cursor, Read, Write};
use std::path::{Path, PathBuf};

/// Content-addressed object database
///
/// Manages storage and retrieval of objects under `.git/objects`.
#[derive(Debug)]
pub struct Database {
    /// Path to the objects directory (typically `.git/objects`)
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    /// Get the path to the objects directory
    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Store an object, returning its ID
    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        self.store_serialized(&object.serialize()?)
    }

    /// Store already-canonical object bytes (`"<kind> <len>\0" ++ payload`),
    /// returning the content hash they are stored under
    ///
    /// Used directly by the pack parser, which produces canonical bytes for
    /// kinds the object model does not parse (tags, delta targets).
    pub fn store_serialized(&self, serialized: &[u8]) -> anyhow::Result<ObjectId> {
        let mut hasher = Sha1::new();
        hasher.update(serialized);
        let object_id = ObjectId::try_parse(format!("{:x}", hasher.finalize()))?;

        // write the object to disk unless it already exists
        let object_path = self.path.join(object_id.to_path());
        if !object_path.exists() {
            std::fs::create_dir_all(
                object_path
                    .parent()
                    .context(format!("Invalid object path {}", object_path.display()))?,
            )
            .context(format!(
                "Unable to create object directory {}",
                object_path.display()
            ))?;

            self.write_object(object_path, serialized)?;
        }

        Ok(object_id)
    }

    /// Load raw object bytes (decompressed, header included)
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let object_path = self.path.join(object_id.to_path());

        self.read_object(object_path)
    }

    /// Load an object's kind and payload, with the header stripped
    ///
    /// The declared length is validated against the actual payload length.
    pub fn load_payload(&self, object_id: &ObjectId) -> anyhow::Result<(ObjectType, Bytes)> {
        let content = self.load(object_id)?;
        let mut reader = Cursor::new(content);

        let (object_type, declared_length) = ObjectType::parse_header(&mut reader)
            .with_context(|| format!("malformed object {}", object_id))?;

        let payload_start = reader.position() as usize;
        let payload = reader.into_inner().slice(payload_start..);
        anyhow::ensure!(
            payload.len() == declared_length,
            "object {} declares {} payload bytes but has {}",
            object_id,
            declared_length,
            payload.len()
        );

        Ok((object_type, payload))
    }

    /// Get the kind of an object without materializing its payload
    pub fn object_type_of(&self, object_id: &ObjectId) -> anyhow::Result<ObjectType> {
        let (object_type, _) = self.parse_object_as_bytes(object_id)?;
        Ok(object_type)
    }

    /// Whether an object with this ID has been stored
    pub fn contains(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).exists()
    }

    /// Parse an object as a Tree, if it is one
    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> anyhow::Result<Option<Tree>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Tree => Ok(Some(Tree::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    /// Parse an object as a Commit, if it is one
    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Commit => Ok(Some(Commit::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    /// Resolve a hexadecimal prefix to the unique object ID it abbreviates
    ///
    /// The prefix must be at least 2 characters so the fan-out directory is
    /// determined. Zero matches and multiple matches are distinct errors.
    pub fn resolve_prefix(&self, prefix: &str) -> anyhow::Result<ObjectId> {
        anyhow::ensure!(
            prefix.len() >= 2 && prefix.len() <= OBJECT_ID_LENGTH,
            "object prefix {:?} must be between 2 and {} characters",
            prefix,
            OBJECT_ID_LENGTH
        );
        anyhow::ensure!(
            prefix.chars().all(|c| c.is_ascii_hexdigit()),
            "object prefix {:?} is not hexadecimal",
            prefix
        );
        let prefix = prefix.to_lowercase();

        let mut matches = self.find_objects_by_prefix(&prefix)?;
        match matches.len() {
            0 => anyhow::bail!("object not found: {}", prefix),
            1 => Ok(matches.remove(0)),
            _ => anyhow::bail!(
                "ambiguous object prefix {} ({} matches)",
                prefix,
                matches.len()
            ),
        }
    }

    /// Find all stored objects whose ID starts with the given prefix
    ///
    /// Only the fan-out directory named by the first two characters needs
    /// scanning.
    fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let mut matches = Vec::new();

        let dir_name = &prefix[..2];
        let file_prefix = &prefix[2..];
        let dir_path = self.path.join(dir_name);

        if dir_path.is_dir() {
            for entry in std::fs::read_dir(&dir_path)? {
                let entry = entry?;
                let file_name = entry.file_name();
                let file_name = file_name.to_string_lossy();

                if file_name.starts_with(file_prefix) {
                    if let Ok(oid) = ObjectId::try_parse(format!("{}{}", dir_name, file_name)) {
                        matches.push(oid);
                    }
                }
            }
        }

        Ok(matches)
    }

    fn parse_object_as_bytes(
        &self,
        object_id: &ObjectId,
    ) -> anyhow::Result<(ObjectType, impl BufRead)> {
        let (object_type, payload) = self.load_payload(object_id)?;

        Ok((object_type, Cursor::new(payload)))
    }

    fn read_object(&self, object_path: PathBuf) -> anyhow::Result<Bytes> {
        let object_content = std::fs::read(&object_path).context(format!(
            "Unable to read object file {}",
            object_path.display()
        ))?;

        Self::decompress(object_content.into())
    }

    fn write_object(&self, object_path: PathBuf, serialized: &[u8]) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .context(format!("Invalid object path {}", object_path.display()))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(serialized)?;

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_object_path)
            .context(format!(
                "Unable to open object file {}",
                temp_object_path.display()
            ))?;

        file.write_all(&object_content).context(format!(
            "Unable to write object file {}",
            temp_object_path.display()
        ))?;

        // rename the temp file to the object file to make it atomic
        std::fs::rename(&temp_object_path, &object_path).context(format!(
            "Unable to rename object file to {}",
            object_path.display()
        ))?;

        Ok(())
    }

    fn compress(data: &[u8]) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(data)
            .context("Unable to compress object content")?;

        encoder
            .finish()
            .map(|compressed_content| compressed_content.into())
            .context("Unable to finish compressing object content")
    }

    fn decompress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .context("Unable to decompress object content")?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }
}
