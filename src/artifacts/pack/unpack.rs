//! Pack-file ingestion
//!
//! A pack is `"PACK" <version:u32> <count:u32>` followed by `count` objects
//! and a trailing SHA-1 over everything before it. Each object starts with a
//! variable-length header byte `Tttt ssss`: continuation bit, 3-bit type
//! code, and the low 4 bits of the uncompressed size; continuation bytes
//! contribute 7 more size bits each, little-endian. The compressed payload
//! follows immediately, with no recorded compressed length, so inflation
//! must stop exactly at the zlib stream boundary.
//!
//! Every decoded object is written to the loose-object store. Ref-delta
//! entries are resolved against bases that must already be stored, which
//! holds for well-formed packs (bases sort before their dependents).
//! Offset-delta entries are not supported.

use crate::areas::database::Database;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::pack::delta;
use anyhow::Context;
use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;
use flate2::read::ZlibDecoder;
use sha1::{Digest, Sha1};
use std::io::{Cursor, Read};

const PACK_MAGIC: &[u8; 4] = b"PACK";
const SUPPORTED_VERSIONS: [u32; 2] = [2, 3];
const HEADER_LENGTH: usize = 12;
const TRAILER_LENGTH: usize = 20;

const PACK_COMMIT: u8 = 1;
const PACK_TREE: u8 = 2;
const PACK_BLOB: u8 = 3;
const PACK_TAG: u8 = 4;
const PACK_OFS_DELTA: u8 = 6;
const PACK_REF_DELTA: u8 = 7;

/// Decode a complete pack stream into the object database
///
/// Returns the number of objects ingested. Any per-object failure aborts
/// the whole pack.
pub fn unpack_into(database: &Database, pack: &[u8]) -> anyhow::Result<u32> {
    anyhow::ensure!(
        pack.len() >= HEADER_LENGTH + TRAILER_LENGTH,
        "pack is too short ({} bytes)",
        pack.len()
    );

    // Verify the trailer before trusting anything else in the stream
    let (body, trailer) = pack.split_at(pack.len() - TRAILER_LENGTH);
    let digest = Sha1::digest(body);
    anyhow::ensure!(digest.as_slice() == trailer, "pack checksum mismatch");

    let mut reader = Cursor::new(body);
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    anyhow::ensure!(&magic == PACK_MAGIC, "missing PACK signature");

    let version = reader.read_u32::<BigEndian>()?;
    anyhow::ensure!(
        SUPPORTED_VERSIONS.contains(&version),
        "unsupported pack version {}",
        version
    );

    let object_count = reader.read_u32::<BigEndian>()?;
    for index in 0..object_count {
        unpack_object(database, &mut reader)
            .with_context(|| format!("failed to unpack object {} of {}", index + 1, object_count))?;
    }

    anyhow::ensure!(
        reader.position() as usize == body.len(),
        "trailing bytes after the last pack object"
    );
    Ok(object_count)
}

fn unpack_object(database: &Database, reader: &mut Cursor<&[u8]>) -> anyhow::Result<()> {
    let (type_code, size) = read_object_header(reader)?;

    match type_code {
        PACK_COMMIT | PACK_TREE | PACK_BLOB | PACK_TAG => {
            let kind = match type_code {
                PACK_COMMIT => ObjectType::Commit,
                PACK_TREE => ObjectType::Tree,
                PACK_TAG => ObjectType::Tag,
                _ => ObjectType::Blob,
            };
            let payload = inflate_exact(reader, size)?;
            database.store_serialized(&wrap_payload(kind, &payload))?;
        }
        PACK_OFS_DELTA => anyhow::bail!("offset-delta pack entries are not supported"),
        PACK_REF_DELTA => {
            let base_oid = ObjectId::read_h40_from(reader)
                .context("truncated ref-delta base reference")?;
            let instructions = inflate_exact(reader, size)?;

            anyhow::ensure!(
                database.contains(&base_oid),
                "delta base object {} is not present",
                base_oid
            );
            let (base_kind, base_payload) = database.load_payload(&base_oid)?;
            let target = delta::apply_delta(&base_payload, &instructions)
                .with_context(|| format!("failed to apply delta against {}", base_oid))?;

            // The reconstructed object inherits the base's kind
            database.store_serialized(&wrap_payload(base_kind, &target))?;
        }
        code => anyhow::bail!("invalid pack object type {}", code),
    }

    Ok(())
}

/// Decode the `Tttt ssss` variable-length object header
fn read_object_header(reader: &mut impl Read) -> anyhow::Result<(u8, usize)> {
    let first = read_byte(reader).context("truncated pack object header")?;
    let type_code = (first >> 4) & 0x7;
    let mut size = (first & 0xf) as usize;
    let mut shift = 4;

    let mut byte = first;
    while byte & 0x80 != 0 {
        byte = read_byte(reader).context("truncated pack object header")?;
        size |= ((byte & 0x7f) as usize) << shift;
        shift += 7;
    }

    Ok((type_code, size))
}

/// Wrap a payload in its canonical `"<kind> <len>\0"` header
pub fn wrap_payload(kind: ObjectType, payload: &[u8]) -> Vec<u8> {
    let mut serialized = format!("{} {}\0", kind.as_str(), payload.len()).into_bytes();
    serialized.extend_from_slice(payload);
    serialized
}

/// Inflate exactly `expected_length` bytes, leaving the reader positioned
/// immediately after the last compressed byte consumed
///
/// The pack format records only the uncompressed size, so the zlib stream
/// boundary decides how far the reader advances. The decoder buffers reads,
/// so the cursor is repositioned from the decoder's consumed-byte count.
fn inflate_exact(reader: &mut Cursor<&[u8]>, expected_length: usize) -> anyhow::Result<Bytes> {
    let start = reader.position();
    let mut decoder = ZlibDecoder::new(&mut *reader);
    let mut payload = Vec::with_capacity(expected_length);
    decoder
        .read_to_end(&mut payload)
        .context("failed to inflate pack object payload")?;
    let consumed = decoder.total_in();
    drop(decoder);
    reader.set_position(start + consumed);

    anyhow::ensure!(
        payload.len() == expected_length,
        "inflated {} bytes where the object header declared {}",
        payload.len(),
        expected_length
    );
    Ok(Bytes::from(payload))
}

fn read_byte(reader: &mut impl Read) -> anyhow::Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}
