//! Smart-HTTP v1 remote
//!
//! Implements the client half of the upload-pack conversation:
//!
//! 1. Discovery: `GET <url>/info/refs?service=git-upload-pack` returns a
//!    pkt-line stream — a service announcement section, then
//!    `<hash> HEAD\0<capabilities>` followed by one record per ref.
//! 2. Negotiation: `POST <url>/git-upload-pack` with a single `want` for the
//!    advertised HEAD, a flush-pkt, and `done`. No haves are sent and the
//!    server's capability list is ignored.
//!
//! The response body after negotiation is pkt-framed acknowledgements
//! (`NAK`/`ACK`) followed by a raw pack stream; the prelude is consumed
//! until the `PACK` magic is in view.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::pack::pkt_line;
use anyhow::Context;
use bytes::Bytes;
use std::io::Cursor;
use std::time::Duration;

const UPLOAD_PACK_SERVICE: &str = "git-upload-pack";
const UPLOAD_PACK_CONTENT_TYPE: &str = "application/x-git-upload-pack-request";
const SERVICE_ANNOUNCEMENT_PREFIX: &[u8] = b"# service=";
const PACK_MAGIC: &[u8] = b"PACK";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The advertised HEAD of a remote repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefAdvertisement {
    pub head_oid: ObjectId,
    pub head_ref: String,
}

impl RefAdvertisement {
    /// The branch name: the segment after the last `/` of the symbolic ref
    pub fn short_branch_name(&self) -> &str {
        self.head_ref
            .rsplit('/')
            .next()
            .unwrap_or(&self.head_ref)
    }
}

/// A smart-HTTP remote repository
pub struct Remote {
    url: String,
    client: reqwest::blocking::Client,
}

impl Remote {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let url = url.trim_end_matches('/').to_string();
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Remote { url, client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the upload-pack ref advertisement
    pub fn discover(&self) -> anyhow::Result<RefAdvertisement> {
        let response = self
            .client
            .get(format!(
                "{}/info/refs?service={}",
                self.url, UPLOAD_PACK_SERVICE
            ))
            .send()
            .with_context(|| format!("ref discovery request to {} failed", self.url))?;
        anyhow::ensure!(
            response.status() == reqwest::StatusCode::OK,
            "ref discovery failed with HTTP {}",
            response.status()
        );

        let body = response
            .bytes()
            .context("failed to read ref discovery response")?;
        parse_advertisement(&mut Cursor::new(body))
    }

    /// Negotiate a single `want` and return the raw pack stream
    pub fn fetch_pack(&self, want: &ObjectId) -> anyhow::Result<Bytes> {
        let mut request_body = Vec::new();
        pkt_line::write_pkt_line(&mut request_body, format!("want {}\n", want).as_bytes());
        pkt_line::write_flush_pkt(&mut request_body);
        pkt_line::write_pkt_line(&mut request_body, b"done\n");

        let response = self
            .client
            .post(format!("{}/{}", self.url, UPLOAD_PACK_SERVICE))
            .header(reqwest::header::CONTENT_TYPE, UPLOAD_PACK_CONTENT_TYPE)
            .body(request_body)
            .send()
            .with_context(|| format!("upload-pack request to {} failed", self.url))?;
        anyhow::ensure!(
            response.status() == reqwest::StatusCode::OK,
            "upload-pack request failed with HTTP {}",
            response.status()
        );

        let body = response
            .bytes()
            .context("failed to read upload-pack response")?;
        strip_pack_prelude(body)
    }
}

/// Parse the discovery response into the advertised HEAD
fn parse_advertisement(reader: &mut Cursor<Bytes>) -> anyhow::Result<RefAdvertisement> {
    let first_record = pkt_line::read_pkt_line(reader)
        .context("malformed ref advertisement")?
        .context("empty ref advertisement")?;

    // Smart servers open with "# service=git-upload-pack" and a flush-pkt;
    // tolerate its absence and treat the first record as the HEAD line.
    let head_record = if first_record.starts_with(SERVICE_ANNOUNCEMENT_PREFIX) {
        while pkt_line::read_pkt_line(reader)?.is_some() {}
        pkt_line::read_pkt_line(reader)?
            .context("ref advertisement ended after the service announcement")?
    } else {
        first_record
    };

    // "<hash> HEAD\0<capabilities>"
    let head_record = match head_record.iter().position(|&byte| byte == 0) {
        Some(separator) => &head_record[..separator],
        None => &head_record[..],
    };
    let head_record = std::str::from_utf8(head_record).context("non-utf8 ref advertisement")?;
    let (head_hex, head_name) = head_record
        .split_once(' ')
        .context("malformed HEAD advertisement record")?;
    anyhow::ensure!(
        head_name.trim_end() == "HEAD",
        "no HEAD advertised by the remote"
    );
    let head_oid = ObjectId::try_parse(head_hex.to_string())?;

    // Remaining records advertise "<hash> <ref-name>" until the flush-pkt;
    // the first symbolic name sharing HEAD's hash wins.
    let mut head_ref = None;
    while let Some(record) = pkt_line::read_pkt_line(reader)? {
        let record = std::str::from_utf8(&record).context("non-utf8 ref advertisement")?;
        let (ref_hex, ref_name) = record
            .trim_end()
            .split_once(' ')
            .context("malformed ref advertisement record")?;

        if ref_hex == head_oid.as_ref() && head_ref.is_none() {
            head_ref = Some(ref_name.to_string());
        }
    }

    let head_ref = head_ref.context("no advertised ref matches HEAD")?;
    Ok(RefAdvertisement { head_oid, head_ref })
}

/// Consume the pkt-framed acknowledgement prelude of an upload-pack
/// response, returning the raw pack bytes that follow
fn strip_pack_prelude(body: Bytes) -> anyhow::Result<Bytes> {
    let mut reader = Cursor::new(body);
    loop {
        let position = reader.position() as usize;
        let remaining = &reader.get_ref()[position..];

        if remaining.starts_with(PACK_MAGIC) {
            return Ok(reader.into_inner().slice(position..));
        }
        anyhow::ensure!(
            !remaining.is_empty(),
            "upload-pack response ended before pack data"
        );

        // NAK, ACK, progress records, and section flushes all get consumed
        pkt_line::read_pkt_line(&mut reader).context("malformed upload-pack response")?;
    }
}
