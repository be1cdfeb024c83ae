//! Commit object
//!
//! Commits bind a tree snapshot to its history and authorship.
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```
//!
//! The header is parsed textually, line by line; nothing relies on fixed
//! byte offsets.

use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::io::{BufRead, Write};

/// Identity used when neither `GIT_AUTHOR_NAME` nor `GIT_AUTHOR_EMAIL` is set
const FALLBACK_AUTHOR_NAME: &str = "grit";
const FALLBACK_AUTHOR_EMAIL: &str = "grit@localhost";

/// Author or committer information
///
/// Contains name, email, and timestamp with timezone information.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    /// Create a new author with the current timestamp
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    /// Create a new author with a specific timestamp
    pub fn new_with_timestamp(
        name: String,
        email: String,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    /// Format the author line value: "Name <email> timestamp timezone"
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// Load author identity from the environment
    ///
    /// Reads `GIT_AUTHOR_NAME`, `GIT_AUTHOR_EMAIL`, and optionally
    /// `GIT_AUTHOR_DATE` (RFC 2822 or `%Y-%m-%d %H:%M:%S %z`). Unset name or
    /// email falls back to the built-in identity; an unset or unparsable
    /// date falls back to the current time.
    pub fn from_env() -> Self {
        let name =
            std::env::var("GIT_AUTHOR_NAME").unwrap_or_else(|_| FALLBACK_AUTHOR_NAME.to_string());
        let email =
            std::env::var("GIT_AUTHOR_EMAIL").unwrap_or_else(|_| FALLBACK_AUTHOR_EMAIL.to_string());
        let timestamp = std::env::var("GIT_AUTHOR_DATE").ok().and_then(|date_str| {
            chrono::DateTime::parse_from_rfc2822(&date_str)
                .or_else(|_| chrono::DateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S %z"))
                .ok()
        });

        match timestamp {
            Some(timestamp) => Author::new_with_timestamp(name, email, timestamp),
            None => Author::new(name, email),
        }
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // Format: "name <email> timestamp timezone"
        // Split from the right to get timezone and timestamp first
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(anyhow::anyhow!("invalid author format"));
        }

        let timezone = parts[0];
        let timestamp = parts[1]
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("invalid author timestamp"))?;
        let name_email_part = parts[2]; // "name <email>"

        let email_start = name_email_part
            .find('<')
            .ok_or_else(|| anyhow::anyhow!("invalid author format: missing '<'"))?;
        let email_end = name_email_part
            .find('>')
            .ok_or_else(|| anyhow::anyhow!("invalid author format: missing '>'"))?;

        let name = name_email_part[..email_start].trim().to_string();
        let email = name_email_part[email_start + 1..email_end].to_string();

        let offset = chrono::FixedOffset::east_opt(
            parse_timezone_offset(timezone)
                .ok_or_else(|| anyhow::anyhow!("invalid author timezone: {}", timezone))?,
        )
        .ok_or_else(|| anyhow::anyhow!("invalid author timezone: {}", timezone))?;
        let timestamp = chrono::DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| anyhow::anyhow!("invalid author timestamp"))?
            .with_timezone(&offset);

        Ok(Author {
            name,
            email,
            timestamp,
        })
    }
}

/// Parse a `[+-]HHMM` timezone into seconds east of UTC
fn parse_timezone_offset(timezone: &str) -> Option<i32> {
    let (sign, digits) = match timezone.split_at_checked(1)? {
        ("+", digits) => (1, digits),
        ("-", digits) => (-1, digits),
        _ => return None,
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    Some(sign * (hours * 3600 + minutes * 60))
}

/// Commit object
///
/// Binds a tree object to zero or more parents, an author/committer pair,
/// and a message.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Parent commit IDs (empty for a root commit)
    parents: Vec<ObjectId>,
    /// Tree object ID representing the directory snapshot
    tree_oid: ObjectId,
    /// Author who wrote the changes
    author: Author,
    /// Committer who recorded the commit
    committer: Author,
    /// Commit message, stored exactly as serialized
    message: String,
}

impl Commit {
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        message: String,
    ) -> Self {
        Commit {
            parents,
            tree_oid,
            author: author.clone(),
            committer: author,
            message,
        }
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();
        writeln!(content_bytes, "tree {}", self.tree_oid)?;
        for parent in &self.parents {
            writeln!(content_bytes, "parent {}", parent)?;
        }
        writeln!(content_bytes, "author {}", self.author.display())?;
        writeln!(content_bytes, "committer {}", self.committer.display())?;
        writeln!(content_bytes)?;
        content_bytes.write_all(self.message.as_bytes())?;

        let mut commit_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        commit_bytes.write_all(header.as_bytes())?;
        commit_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(commit_bytes))
    }
}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;
        let content = String::from_utf8(content).context("commit payload is not utf-8")?;

        // Headers end at the first blank line; everything after is the
        // message, kept byte-exact
        let (headers, message) = content
            .split_once("\n\n")
            .context("invalid commit object: missing blank line before message")?;
        let mut lines = headers.lines();

        let tree_line = lines
            .next()
            .context("invalid commit object: missing tree line")?;
        let tree_oid = tree_line
            .strip_prefix("tree ")
            .context("invalid commit object: invalid tree line")?
            .to_string();
        let tree_oid = ObjectId::try_parse(tree_oid)?;

        // Parse all parent lines (0, 1, or several)
        let mut parents = Vec::new();
        let mut next_line = lines
            .next()
            .context("invalid commit object: missing author line")?;

        while let Some(parent_oid) = next_line.strip_prefix("parent ") {
            parents.push(ObjectId::try_parse(parent_oid.to_string())?);

            next_line = lines
                .next()
                .context("invalid commit object: missing author line")?;
        }

        let author = next_line
            .strip_prefix("author ")
            .context("invalid commit object: invalid author line")?;
        let author = Author::try_from(author)?;

        let committer_line = lines
            .next()
            .context("invalid commit object: missing committer line")?;
        let _committer = committer_line
            .strip_prefix("committer ")
            .map(Author::try_from)
            .context("invalid commit object: invalid committer line")??;

        Ok(Self::new(parents, tree_oid, author, message.to_string()))
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }
}
