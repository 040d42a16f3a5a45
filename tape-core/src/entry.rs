use alloc::string::{String, ToString};
use core::fmt::Display;

use crate::Error;

/// Kind flag byte written for each entry
pub const FLAG_FILE: u8 = 0;
pub const FLAG_DIRECTORY: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Byte range in the uncompressed data section
    File { offset: u64, size: u64 },
    Directory,
}

impl EntryKind {
    pub fn flag(&self) -> u8 {
        match self {
            EntryKind::File { .. } => FLAG_FILE,
            EntryKind::Directory => FLAG_DIRECTORY,
        }
    }
}

/// One row of the entry table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Slash-separated path relative to the extract directory. Directories end
    /// with `/`.
    pub path: String,
    pub kind: EntryKind,
}

impl Display for Entry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            EntryKind::File { offset, size } => {
                write!(f, "path={:?} offset={} size={}", self.path, offset, size)
            }
            EntryKind::Directory => write!(f, "path={:?} directory", self.path),
        }
    }
}

impl Entry {
    pub fn file(path: impl ToString, offset: u64, size: u64) -> Entry {
        Entry {
            path: path.to_string(),
            kind: EntryKind::File { offset, size },
        }
    }

    pub fn directory(path: impl ToString) -> Entry {
        Entry {
            path: path.to_string(),
            kind: EntryKind::Directory,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn offset(&self) -> u64 {
        match self.kind {
            EntryKind::File { offset, .. } => offset,
            EntryKind::Directory => 0,
        }
    }

    /// Size of the file data; directories have none
    pub fn size(&self) -> u64 {
        match self.kind {
            EntryKind::File { size, .. } => size,
            EntryKind::Directory => 0,
        }
    }

    /// Bytes this entry occupies in the entry table
    pub fn encoded_len(&self) -> usize {
        let extent = match self.kind {
            EntryKind::File { .. } => 16,
            EntryKind::Directory => 0,
        };
        1 + 4 + self.path.len() + extent
    }

    /// Slice this entry's bytes out of the uncompressed data section.
    ///
    /// The range is checked against `data` so that a lying entry table is
    /// reported instead of read out of bounds. Directories yield an empty
    /// slice.
    pub fn data<'a>(&self, data: &'a [u8]) -> Result<&'a [u8], Error> {
        let (offset, size) = match self.kind {
            EntryKind::File { offset, size } => (offset, size),
            EntryKind::Directory => return Ok(&[]),
        };
        let corrupt = || Error::CorruptOffsetTable {
            path: self.path.clone(),
            offset,
            size,
            data_len: data.len() as u64,
        };

        let end = offset.checked_add(size).ok_or_else(corrupt)?;
        if end > data.len() as u64 {
            return Err(corrupt());
        }
        let start = usize::try_from(offset)?;
        let end = usize::try_from(end)?;
        data.get(start..end).ok_or_else(corrupt)
    }
}
