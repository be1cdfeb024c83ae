//! Tree entry modes
//!
//! Only two modes are ever emitted: regular files (`100644`) and
//! subdirectories (`40000`). Foreign modes read from external trees
//! (executables, symlinks) are tolerated and treated as regular files.

/// Mode of a tree entry, rendered in octal ASCII with no leading zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    Regular,
    Directory,
}

impl EntryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMode::Regular => "100644",
            EntryMode::Directory => "40000",
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    pub fn from_octal_str(mode: &str) -> anyhow::Result<Self> {
        if mode.is_empty() || !mode.bytes().all(|b| b.is_ascii_digit() && b < b'8') {
            anyhow::bail!("invalid tree entry mode: {:?}", mode);
        }

        // Tolerate a leading zero (`040000`) from external producers
        match mode.trim_start_matches('0') {
            "40000" => Ok(EntryMode::Directory),
            _ => Ok(EntryMode::Regular),
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
