//! Builders for objects, pack files, and pkt-line streams, used to assemble
//! repository fixtures without shelling out to git

use flate2::Compression;
use flate2::write::ZlibEncoder;
use sha1::{Digest, Sha1};
use std::io::Write;

pub const PACK_COMMIT: u8 = 1;
pub const PACK_TREE: u8 = 2;
pub const PACK_BLOB: u8 = 3;
pub const PACK_TAG: u8 = 4;
pub const PACK_REF_DELTA: u8 = 7;

/// Wrap a payload in its canonical `"<kind> <len>\0"` header
pub fn serialize_object(kind: &str, payload: &[u8]) -> Vec<u8> {
    let mut serialized = format!("{} {}\0", kind, payload.len()).into_bytes();
    serialized.extend_from_slice(payload);
    serialized
}

/// SHA-1 of canonical object bytes, as lowercase hex
pub fn object_hex(serialized: &[u8]) -> String {
    format!("{:x}", Sha1::digest(serialized))
}

pub fn hex_to_raw(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("valid hex"))
        .collect()
}

/// One serialized tree entry: `<mode> <name>\0<raw-oid>`
pub fn tree_entry(mode: &str, name: &str, oid_hex: &str) -> Vec<u8> {
    let mut entry = format!("{} {}\0", mode, name).into_bytes();
    entry.extend(hex_to_raw(oid_hex));
    entry
}

/// Commit payload with a fixed identity, suitable for stable hashes
pub fn commit_payload(tree_hex: &str, parent_hex: Option<&str>, message: &str) -> Vec<u8> {
    let mut payload = format!("tree {}\n", tree_hex);
    if let Some(parent_hex) = parent_hex {
        payload.push_str(&format!("parent {}\n", parent_hex));
    }
    payload.push_str("author A U Thor <author@example.com> 1705312800 +0000\n");
    payload.push_str("committer A U Thor <author@example.com> 1705312800 +0000\n");
    payload.push_str("\n");
    payload.push_str(message);
    payload.into_bytes()
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("deflate write");
    encoder.finish().expect("deflate finish")
}

pub fn pkt_line(payload: &[u8]) -> Vec<u8> {
    let mut record = format!("{:04x}", payload.len() + 4).into_bytes();
    record.extend_from_slice(payload);
    record
}

pub fn flush_pkt() -> Vec<u8> {
    b"0000".to_vec()
}

/// Incremental pack-file builder producing a checksummed stream
pub struct PackBuilder {
    entries: Vec<Vec<u8>>,
}

impl PackBuilder {
    pub fn new() -> Self {
        PackBuilder {
            entries: Vec::new(),
        }
    }

    pub fn push_object(&mut self, type_code: u8, payload: &[u8]) {
        let mut entry = Self::entry_header(type_code, payload.len());
        entry.extend(deflate(payload));
        self.entries.push(entry);
    }

    pub fn push_ref_delta(&mut self, base_hex: &str, instructions: &[u8]) {
        let mut entry = Self::entry_header(PACK_REF_DELTA, instructions.len());
        entry.extend(hex_to_raw(base_hex));
        entry.extend(deflate(instructions));
        self.entries.push(entry);
    }

    pub fn build(self) -> Vec<u8> {
        let mut pack = b"PACK".to_vec();
        pack.extend((2u32).to_be_bytes());
        pack.extend((self.entries.len() as u32).to_be_bytes());
        for entry in &self.entries {
            pack.extend(entry);
        }
        let digest = Sha1::digest(&pack);
        pack.extend(digest);
        pack
    }

    fn entry_header(type_code: u8, mut size: usize) -> Vec<u8> {
        let mut byte = ((type_code & 0x7) << 4) | (size & 0xf) as u8;
        size >>= 4;

        let mut header = Vec::new();
        while size > 0 {
            header.push(byte | 0x80);
            byte = (size & 0x7f) as u8;
            size >>= 7;
        }
        header.push(byte);
        header
    }
}
