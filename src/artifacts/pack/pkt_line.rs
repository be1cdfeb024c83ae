//! Pkt-line framing for the smart-HTTP v1 protocol
//!
//! A pkt-line is a 4-character ASCII hex length prefix (counting the prefix
//! itself) followed by the payload. The sentinel `0000` (flush-pkt) ends a
//! group of records; `0004` is a valid empty record, distinct from a flush.

use anyhow::Context;
use bytes::Bytes;
use std::io::Read;

pub const FLUSH_PKT: &[u8; 4] = b"0000";

const LENGTH_DIGITS: usize = 4;
// git reserves record lengths 65521 to 65535
const MAX_PAYLOAD_LENGTH: usize = 65520 - LENGTH_DIGITS;

/// Read one pkt-line record
///
/// Returns `None` at a flush-pkt or at a clean end of stream. A truncated
/// length prefix or payload is an error.
pub fn read_pkt_line<R: Read>(reader: &mut R) -> anyhow::Result<Option<Bytes>> {
    let mut length_digits = [0u8; LENGTH_DIGITS];
    let mut filled = 0;
    while filled < LENGTH_DIGITS {
        let n = reader.read(&mut length_digits[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if filled == 0 {
        return Ok(None); // clean end of stream
    }
    anyhow::ensure!(filled == LENGTH_DIGITS, "truncated pkt-line length prefix");

    let length = std::str::from_utf8(&length_digits)
        .ok()
        .and_then(|digits| usize::from_str_radix(digits, 16).ok())
        .with_context(|| format!("invalid pkt-line length prefix: {:?}", length_digits))?;

    if length == 0 {
        return Ok(None); // flush-pkt
    }
    anyhow::ensure!(
        length >= LENGTH_DIGITS,
        "pkt-line length {} shorter than its own prefix",
        length
    );

    let mut payload = vec![0; length - LENGTH_DIGITS];
    reader
        .read_exact(&mut payload)
        .context("truncated pkt-line payload")?;
    Ok(Some(Bytes::from(payload)))
}

/// Append one pkt-line record
pub fn write_pkt_line(out: &mut Vec<u8>, payload: &[u8]) {
    debug_assert!(payload.len() <= MAX_PAYLOAD_LENGTH);

    out.extend_from_slice(format!("{:04x}", payload.len() + LENGTH_DIGITS).as_bytes());
    out.extend_from_slice(payload);
}

/// Append a flush-pkt
pub fn write_flush_pkt(out: &mut Vec<u8>) {
    out.extend_from_slice(FLUSH_PKT);
}
