use anyhow::Context;
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectType {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
            ObjectType::Tag => "tag",
        }
    }

    /// Parse a `"<kind> <length>\0"` object header, returning the kind and
    /// the declared payload length. The reader is left positioned at the
    /// first payload byte.
    pub fn parse_header(data_reader: &mut impl BufRead) -> anyhow::Result<(ObjectType, usize)> {
        let mut object_type = Vec::new();
        data_reader.read_until(b' ', &mut object_type)?;
        if object_type.pop() != Some(b' ') {
            anyhow::bail!("malformed object header: missing type separator");
        }

        let object_type = std::str::from_utf8(&object_type)
            .context("malformed object header: non-utf8 type")?;
        let object_type = ObjectType::try_from(object_type)?;

        let mut length = Vec::new();
        data_reader.read_until(b'\0', &mut length)?;
        if length.pop() != Some(b'\0') {
            anyhow::bail!("malformed object header: missing length separator");
        }

        let length = std::str::from_utf8(&length)
            .ok()
            .and_then(|length| length.parse::<usize>().ok())
            .context("malformed object header: invalid length")?;

        Ok((object_type, length))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            "tag" => Ok(ObjectType::Tag),
            _ => Err(anyhow::anyhow!("invalid object type: {}", value)),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
