use std::fmt;

use tape_core::{CompressionMethod, Entry, EntryKind, Header, Version, SALT_LEN};

/// What `list` shows about a container. Built from the header alone, so it
/// needs no password and never touches the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub version: Version,
    pub entries: Vec<Entry>,
    pub salt: Option<[u8; SALT_LEN]>,
    pub payload_len: u64,
    /// Sum of all file sizes
    pub full_size: u64,
    pub compression: CompressionMethod,
}

impl Summary {
    pub fn new(header: &Header) -> Summary {
        Summary {
            version: header.version,
            entries: header.entries.clone(),
            salt: header.salt,
            payload_len: header.payload_len,
            full_size: header.full_size(),
            compression: header.compression,
        }
    }

    /// Uncompressed size over stored size, `None` for an empty payload
    pub fn ratio(&self) -> Option<f64> {
        if self.payload_len == 0 {
            None
        } else {
            Some(self.full_size as f64 / self.payload_len as f64)
        }
    }

    pub fn ratio_string(&self) -> String {
        match self.ratio() {
            Some(ratio) => format!("{:.2}x", ratio),
            None => String::from("n/a"),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "binary version {}", self.version)?;
        for entry in &self.entries {
            match entry.kind {
                EntryKind::Directory => writeln!(f, "directory\t{}", entry.path)?,
                EntryKind::File { size, .. } => writeln!(f, "{} bytes\t{}", size, entry.path)?,
            }
        }
        match &self.salt {
            Some(salt) => writeln!(
                f,
                "encryption: yes; salt: `{}`",
                String::from_utf8_lossy(salt)
            )?,
            None => writeln!(f, "encryption: no")?,
        }
        writeln!(
            f,
            "data section length: {} bytes ({} bytes uncompressed)",
            self.payload_len, self.full_size
        )?;
        write!(
            f,
            "compressing method: {} {}",
            self.compression,
            self.ratio_string()
        )
    }
}
