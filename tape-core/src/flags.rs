use alloc::string::ToString;
use core::fmt;
use core::str::FromStr;

use bitflags::bitflags;

use crate::Error;

/// Whole-payload compression applied before encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionMethod {
    None = 0,
    #[default]
    Zlib = 1,
    Lzma = 2,
    Bzip2 = 3,
}

impl CompressionMethod {
    pub const ALL: [CompressionMethod; 4] = [
        CompressionMethod::None,
        CompressionMethod::Zlib,
        CompressionMethod::Lzma,
        CompressionMethod::Bzip2,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Name accepted on the command line and shown in listings
    pub fn name(self) -> &'static str {
        match self {
            CompressionMethod::None => "none",
            CompressionMethod::Zlib => "zlib",
            CompressionMethod::Lzma => "lzma",
            CompressionMethod::Bzip2 => "bz2",
        }
    }
}

impl TryFrom<u8> for CompressionMethod {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self, Error> {
        match id {
            0 => Ok(CompressionMethod::None),
            1 => Ok(CompressionMethod::Zlib),
            2 => Ok(CompressionMethod::Lzma),
            3 => Ok(CompressionMethod::Bzip2),
            other => Err(Error::UnknownCompressionMethod(other)),
        }
    }
}

impl FromStr for CompressionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        CompressionMethod::ALL
            .into_iter()
            .find(|method| method.name() == s)
            .ok_or_else(|| Error::UnknownMethodName(s.to_string()))
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Optional header sections a format generation carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        /// Compression method byte after the payload length
        const COMPRESSION = 1 << 0;
        /// Encrypted flag and salt before the payload length
        const ENCRYPTION = 1 << 1;
    }
}

impl Capabilities {
    /// Generation 1 stored raw data, 2 added compression, 3 added encryption.
    pub fn for_major(major: u8) -> Option<Capabilities> {
        match major {
            1 => Some(Capabilities::empty()),
            2 => Some(Capabilities::COMPRESSION),
            3 => Some(Capabilities::COMPRESSION | Capabilities::ENCRYPTION),
            _ => None,
        }
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(&name.to_lowercase())?;
            first = false;
        }
        Ok(())
    }
}
