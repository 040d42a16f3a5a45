//! Header serialization. All integers are little-endian:
//!
//! ```text
//! [u8; 4]  magic "TAPE"
//! u8       version major
//! u8       version minor
//! u32      entry count
//! entries:
//!   u8       kind (0 = file, 1 = directory)
//!   u32      name length
//!   [u8]     name, UTF-8
//!   u64      offset    (files only)
//!   u64      size      (files only)
//! u8       encrypted flag
//! [u8; 8]  salt      (encrypted only)
//! u64      payload length
//! u8       compression method
//! [u8]     payload
//! ```
use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;

use crate::entry::{FLAG_DIRECTORY, FLAG_FILE};
use crate::reader::Reader;
use crate::{
    Capabilities, CompressionMethod, Entry, EntryKind, Error, MAGIC, PREAMBLE_SIZE, SALT_LEN,
    VERSION,
};

/// Smallest possible table entry: kind, name length and a one byte name
const MIN_ENTRY_SIZE: usize = 1 + 4 + 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub fn capabilities(&self) -> Option<Capabilities> {
        Capabilities::for_major(self.major)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub version: Version,
    pub entries: Vec<Entry>,
    /// Cleartext salt, present when the payload is encrypted
    pub salt: Option<[u8; SALT_LEN]>,
    /// Stored payload length, including the encrypted salt copy
    pub payload_len: u64,
    pub compression: CompressionMethod,
}

impl Header {
    pub fn new(
        entries: Vec<Entry>,
        salt: Option<[u8; SALT_LEN]>,
        payload_len: u64,
        compression: CompressionMethod,
    ) -> Header {
        Header {
            version: VERSION,
            entries,
            salt,
            payload_len,
            compression,
        }
    }

    /// Parse a header and return it with the payload that follows it.
    ///
    /// Bytes past the payload are not examined. The major version is checked
    /// before anything after it is read.
    pub fn parse(data: &[u8]) -> Result<(Header, &[u8]), Error> {
        let mut reader = Reader::new(data);

        let magic = reader
            .take(MAGIC.len(), "magic")
            .map_err(|_| Error::NotATapeFile)?;
        if magic != MAGIC {
            return Err(Error::NotATapeFile);
        }

        let version = Version {
            major: reader.u8("version major")?,
            minor: reader.u8("version minor")?,
        };
        let capabilities = match version.capabilities() {
            Some(caps) if version.major == VERSION.major => caps,
            _ => {
                return Err(Error::VersionMismatch {
                    expected: VERSION,
                    found: version,
                })
            }
        };

        let count = reader.u32("entry count")?;
        // A lying count must not be able to reserve more than the input can hold
        let capacity = (count as usize).min(reader.remaining() / MIN_ENTRY_SIZE);
        let mut entries = Vec::with_capacity(capacity);
        for index in 0..count {
            entries.push(read_entry(&mut reader, index)?);
        }

        let salt = if capabilities.contains(Capabilities::ENCRYPTION) {
            match reader.u8("encrypted flag")? {
                0 => None,
                1 => Some(reader.array::<SALT_LEN>("salt")?),
                value => {
                    return Err(Error::InvalidFlag {
                        field: "encrypted",
                        value,
                    })
                }
            }
        } else {
            None
        };

        let payload_len = reader.u64("payload length")?;
        let compression = if capabilities.contains(Capabilities::COMPRESSION) {
            CompressionMethod::try_from(reader.u8("compression method")?)?
        } else {
            CompressionMethod::None
        };

        let len = usize::try_from(payload_len).map_err(|_| Error::TruncatedFile {
            field: "payload",
            needed: payload_len,
            available: reader.remaining() as u64,
        })?;
        let payload = reader.take(len, "payload")?;

        Ok((
            Header {
                version,
                entries,
                salt,
                payload_len,
                compression,
            },
            payload,
        ))
    }

    /// Append the serialized header (everything before the payload) to `out`
    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        let capabilities = self.capabilities();
        let count = u32::try_from(self.entries.len()).map_err(|_| Error::Overflow)?;

        out.reserve(self.encoded_len());
        out.extend_from_slice(&MAGIC);
        out.push(self.version.major);
        out.push(self.version.minor);
        out.extend_from_slice(&count.to_le_bytes());

        for entry in &self.entries {
            let name = entry.path.as_bytes();
            let name_len = u32::try_from(name.len()).map_err(|_| Error::Overflow)?;
            out.push(entry.kind.flag());
            out.extend_from_slice(&name_len.to_le_bytes());
            out.extend_from_slice(name);
            if let EntryKind::File { offset, size } = entry.kind {
                out.extend_from_slice(&offset.to_le_bytes());
                out.extend_from_slice(&size.to_le_bytes());
            }
        }

        if capabilities.contains(Capabilities::ENCRYPTION) {
            match &self.salt {
                Some(salt) => {
                    out.push(1);
                    out.extend_from_slice(salt);
                }
                None => out.push(0),
            }
        }

        out.extend_from_slice(&self.payload_len.to_le_bytes());
        if capabilities.contains(Capabilities::COMPRESSION) {
            out.push(self.compression.id());
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }

    /// Serialized size of everything before the payload
    pub fn encoded_len(&self) -> usize {
        let capabilities = self.capabilities();
        let entries: usize = self.entries.iter().map(Entry::encoded_len).sum();
        let mut len = PREAMBLE_SIZE + entries + 8;
        if capabilities.contains(Capabilities::ENCRYPTION) {
            len += 1;
            if self.salt.is_some() {
                len += SALT_LEN;
            }
        }
        if capabilities.contains(Capabilities::COMPRESSION) {
            len += 1;
        }
        len
    }

    pub fn capabilities(&self) -> Capabilities {
        self.version
            .capabilities()
            .unwrap_or_else(Capabilities::empty)
    }

    pub fn is_encrypted(&self) -> bool {
        self.salt.is_some()
    }

    /// Total of all file sizes, i.e. the expected uncompressed data length
    pub fn full_size(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |acc, entry| acc.saturating_add(entry.size()))
    }

    /// Check every file range against the decoded data section
    pub fn check_extents(&self, data: &[u8]) -> Result<(), Error> {
        for entry in &self.entries {
            entry.data(data)?;
        }
        Ok(())
    }
}

fn read_entry(reader: &mut Reader, index: u32) -> Result<Entry, Error> {
    let flag = reader.u8("entry kind")?;
    let name_len = usize::try_from(reader.u32("entry name length")?)?;
    let name = reader.take(name_len, "entry name")?;
    let path = core::str::from_utf8(name).map_err(|_| Error::MalformedEntry {
        index,
        reason: "name is not valid UTF-8",
    })?;
    if path.is_empty() {
        return Err(Error::MalformedEntry {
            index,
            reason: "empty name",
        });
    }

    let kind = match flag {
        FLAG_FILE => {
            if path.ends_with('/') {
                return Err(Error::MalformedEntry {
                    index,
                    reason: "file name ends with a separator",
                });
            }
            EntryKind::File {
                offset: reader.u64("entry offset")?,
                size: reader.u64("entry size")?,
            }
        }
        FLAG_DIRECTORY => EntryKind::Directory,
        _ => {
            return Err(Error::MalformedEntry {
                index,
                reason: "unknown kind flag",
            })
        }
    };

    Ok(Entry {
        path: path.to_string(),
        kind,
    })
}
