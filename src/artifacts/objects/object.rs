//! Core object traits
//!
//! This module defines the fundamental traits that all objects implement:
//! - `Packable`: Serialization to the canonical on-disk format
//! - `Unpackable`: Deserialization from the canonical on-disk format
//! - `Object`: Common object operations (ID computation, storage path)
//!
//! ## Object Format
//!
//! All objects are stored as:
//! ```text
//! <type> <size>\0<content>
//! ```
//! and the object ID is the SHA-1 hash of exactly these bytes. The stored
//! file is this form compressed with zlib.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::BufRead;
use std::path::PathBuf;

/// Trait for serializing objects to the canonical byte form (header included)
pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

/// Trait for deserializing objects (header already consumed)
pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

/// Core object trait
///
/// Implemented by all object types (Blob, Tree, Commit).
pub trait Object: Packable {
    /// Get the object's type
    fn object_type(&self) -> ObjectType;

    /// Compute the object ID (SHA-1 of the canonical serialization)
    fn object_id(&self) -> Result<ObjectId> {
        let content = self.serialize()?;
        let mut hasher = Sha1::new();
        hasher.update(&content);

        let oid = hasher.finalize();
        ObjectId::try_parse(format!("{oid:x}"))
    }

    /// Get the file system path where this object would be stored
    fn object_path(&self) -> Result<PathBuf> {
        Ok(self.object_id()?.to_path())
    }
}
