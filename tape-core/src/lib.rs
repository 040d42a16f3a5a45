//! On-disk format of the tape archive container.
//!
//! A container is a header (magic, version, entry table, encryption and
//! compression descriptors) followed by a single payload holding every file's
//! bytes. See [`Header`] for the exact layout.
#![no_std]
extern crate alloc;
#[cfg(test)]
extern crate std;

pub use crate::cipher::{apply_keystream, Keystream};
pub use crate::entry::{Entry, EntryKind};
pub use crate::error::Error;
pub use crate::flags::{Capabilities, CompressionMethod};
pub use crate::header::{Header, Version};

mod cipher;
mod entry;
mod error;
mod flags;
mod header;
mod reader;

/// Leading bytes of every container.
pub const MAGIC: [u8; 4] = *b"TAPE";

/// Version written by this codec. Containers with another major are rejected.
pub const VERSION: Version = Version { major: 3, minor: 0 };

/// Length of the password-check salt.
pub const SALT_LEN: usize = 8;

/// Magic, major, minor and entry count.
pub const PREAMBLE_SIZE: usize = MAGIC.len() + 1 + 1 + 4;
