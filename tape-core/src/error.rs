use alloc::string::String;
use core::error;
use core::fmt::{Display, Formatter, Result};

use crate::Version;

#[derive(Debug)]
pub enum Error {
    /// Magic bytes missing or wrong
    NotATapeFile,
    VersionMismatch {
        expected: Version,
        found: Version,
    },
    MalformedEntry {
        index: u32,
        reason: &'static str,
    },
    InvalidFlag {
        field: &'static str,
        value: u8,
    },
    UnknownCompressionMethod(u8),
    UnknownMethodName(String),
    TruncatedFile {
        field: &'static str,
        needed: u64,
        available: u64,
    },
    CorruptOffsetTable {
        path: String,
        offset: u64,
        size: u64,
        data_len: u64,
    },
    Overflow,
    TryFromInt(core::num::TryFromIntError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> Result {
        use Error::*;

        match self {
            NotATapeFile => write!(f, "Not a tape file"),
            VersionMismatch { expected, found } => write!(
                f,
                "Major format versions don't match (supported {}, found {})",
                expected, found
            ),
            MalformedEntry { index, reason } => {
                write!(f, "Malformed entry #{}: {}", index, reason)
            }
            InvalidFlag { field, value } => write!(f, "Invalid {} flag: {}", field, value),
            UnknownCompressionMethod(id) => write!(f, "Unknown compression method id {}", id),
            UnknownMethodName(name) => write!(
                f,
                "'{}' is not a supported compression method (supported: none, zlib, lzma, bz2)",
                name
            ),
            TruncatedFile {
                field,
                needed,
                available,
            } => write!(
                f,
                "Truncated file while reading {}: needed {} bytes, {} available",
                field, needed, available
            ),
            CorruptOffsetTable {
                path,
                offset,
                size,
                data_len,
            } => write!(
                f,
                "Corrupt offset table: '{}' spans {}+{} but data section is {} bytes",
                path, offset, size, data_len
            ),
            Overflow => write!(f, "Overflow"),
            TryFromInt(err) => write!(f, "TryFromInt: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::TryFromInt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<core::num::TryFromIntError> for Error {
    fn from(err: core::num::TryFromIntError) -> Error {
        Error::TryFromInt(err)
    }
}
