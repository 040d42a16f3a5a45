use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use rand::Rng;
use tape_core::{apply_keystream, CompressionMethod, Entry, Header, SALT_LEN};

use crate::compress::compress;
use crate::ext::check_path;
use crate::resolve::{resolve_root, SourceKind};
use crate::{wrap_io_err, Error};

/// Characters a salt is drawn from
pub const SALT_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_-+=[]{}()'\"<>,./?!;:|";

/// How an archive is packed.
///
/// ```
/// use tape::{CompressionMethod, PackOptions};
///
/// let options = PackOptions::new()
///     .recursive(true)
///     .compression(CompressionMethod::None)
///     .password("hunter2");
/// assert!(options.recursive);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackOptions {
    /// Descend into directories given as roots
    pub recursive: bool,
    pub compression: CompressionMethod,
    /// Obfuscate the payload with this password
    pub password: Option<String>,
}

impl PackOptions {
    pub fn new() -> PackOptions {
        PackOptions::default()
    }

    pub fn recursive(mut self, recursive: bool) -> PackOptions {
        self.recursive = recursive;
        self
    }

    pub fn compression(mut self, method: CompressionMethod) -> PackOptions {
        self.compression = method;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> PackOptions {
        self.password = Some(password.into());
        self
    }
}

struct BuilderEntry {
    /// Path recorded in the archive
    target: String,
    kind: BuilderEntryKind,
}

impl BuilderEntry {
    // Verify inputs to ensure that archives that can't be extracted are not
    // built by mistake
    fn new(target: &str, kind: BuilderEntryKind) -> Result<BuilderEntry, Error> {
        check_path(target)?;
        let target = match kind {
            BuilderEntryKind::Directory => format!("{}/", target.trim_end_matches('/')),
            _ => target.trim_end_matches('/').to_string(),
        };
        Ok(BuilderEntry { target, kind })
    }
}

enum BuilderEntryKind {
    /// Path to regular file during build
    File(PathBuf),

    Reader(Box<dyn Read>),

    Directory,
}

impl fmt::Debug for BuilderEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BuilderEntryKind::File(p) => write!(f, "File({:?})", p),
            BuilderEntryKind::Reader(_) => write!(f, "Reader(_)"),
            BuilderEntryKind::Directory => write!(f, "Directory"),
        }
    }
}

/// Builder pattern for constructing tape archives. Holds a list of entries
/// and consumes itself to construct an archive.
///
/// Entries are written in the order they were added. Adding the same target
/// twice is allowed; the later entry wins on extraction.
///
/// # Example
/// ```
/// use tape::{CompressionMethod, PackOptions, TapeBuilder};
///
/// let mut builder = TapeBuilder::new(PackOptions::new().compression(CompressionMethod::None));
/// builder
///     .file_reader(&b"hi"[..], "a.txt").unwrap()
///     .dir("b").unwrap()
///     .file_reader(&b"yo"[..], "b/c.txt").unwrap();
///
/// let archive = builder.to_bytes().unwrap();
/// let (header, payload) = tape::Header::parse(&archive).unwrap();
/// assert_eq!(header.entries.len(), 3);
/// assert_eq!(payload, b"hiyo");
/// ```
pub struct TapeBuilder {
    options: PackOptions,
    entries: Vec<BuilderEntry>,
}

impl TapeBuilder {
    pub fn new(options: PackOptions) -> TapeBuilder {
        TapeBuilder {
            options,
            entries: Vec::new(),
        }
    }

    /// Resolve `root` and add everything it names. Directories are descended
    /// into when the options ask for it.
    pub fn add_root(&mut self, root: impl AsRef<Path>) -> Result<&mut TapeBuilder, Error> {
        let mut manifest = Vec::new();
        resolve_root(root.as_ref(), self.options.recursive, &mut manifest)?;
        for source in manifest {
            let kind = match source.kind {
                SourceKind::File => BuilderEntryKind::File(source.source()),
                SourceKind::Directory => BuilderEntryKind::Directory,
            };
            self.entries
                .push(BuilderEntry::new(&source.archive_path, kind)?);
        }
        Ok(self)
    }

    /// Add a regular file to this builder. `source` is the position of the
    /// file on the build system.
    pub fn file(
        &mut self,
        source: impl AsRef<Path>,
        target: &str,
    ) -> Result<&mut TapeBuilder, Error> {
        self.entries.push(BuilderEntry::new(
            target,
            BuilderEntryKind::File(source.as_ref().to_path_buf()),
        )?);
        Ok(self)
    }

    /// Add a file to this builder. `source` is a Reader to read the entry's
    /// data from.
    pub fn file_reader(
        &mut self,
        source: impl Read + 'static,
        target: &str,
    ) -> Result<&mut TapeBuilder, Error> {
        self.entries.push(BuilderEntry::new(
            target,
            BuilderEntryKind::Reader(Box::new(source)),
        )?);
        Ok(self)
    }

    /// Add an empty directory entry. A trailing `/` is added when missing.
    pub fn dir(&mut self, target: &str) -> Result<&mut TapeBuilder, Error> {
        self.entries
            .push(BuilderEntry::new(target, BuilderEntryKind::Directory)?);
        Ok(self)
    }

    /// Consume this `TapeBuilder`, writing the whole container to `w`.
    /// Returns the number of bytes written.
    pub fn write_archive<W: Write>(self, w: &mut W) -> Result<u64, Error> {
        let bytes = self.to_bytes()?;
        w.write_all(&bytes)
            .map_err(wrap_io_err!("Writing archive"))?;
        Ok(bytes.len() as u64)
    }

    /// Consume this `TapeBuilder` and return the container bytes
    pub fn to_bytes(self) -> Result<Vec<u8>, Error> {
        let TapeBuilder { options, entries } = self;
        let (entries, data) = write_data(entries)?;

        let compressed = compress(options.compression, &data)?;
        let (salt, payload) = match &options.password {
            Some(password) => {
                let salt = generate_salt();
                let mut payload = Vec::with_capacity(SALT_LEN + compressed.len());
                payload.extend_from_slice(&salt);
                payload.extend_from_slice(&compressed);
                apply_keystream(&mut payload, password.as_bytes());
                (Some(salt), payload)
            }
            None => (None, compressed),
        };

        let header = Header::new(
            entries,
            salt,
            u64::try_from(payload.len()).map_err(tape_core::Error::from)?,
            options.compression,
        );
        let mut out = header.to_bytes()?;
        out.extend_from_slice(&payload);

        tracing::info!(
            "packed {} entries: {} bytes of data, {} byte payload ({}{})",
            header.entries.len(),
            data.len(),
            payload.len(),
            options.compression,
            if salt.is_some() { ", encrypted" } else { "" },
        );
        Ok(out)
    }
}

impl fmt::Debug for TapeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let entries: Vec<_> = self
            .entries
            .iter()
            .map(|e| (&e.target, &e.kind))
            .collect();
        f.debug_struct("TapeBuilder")
            .field("options", &self.options)
            .field("entries", &entries)
            .finish()
    }
}

/// Concatenate file contents in entry order, assigning each file its range
/// of the data section.
fn write_data(entries: Vec<BuilderEntry>) -> Result<(Vec<Entry>, Vec<u8>), Error> {
    let mut table = Vec::with_capacity(entries.len());
    let mut data = Vec::new();
    let mut written: u64 = 0;

    for builder_entry in entries {
        let source: Box<dyn Read> = match builder_entry.kind {
            BuilderEntryKind::Directory => {
                table.push(Entry::directory(builder_entry.target));
                continue;
            }
            BuilderEntryKind::File(path) => Box::new(
                File::open(&path).map_err(wrap_io_err!(path, "Opening source file"))?,
            ),
            BuilderEntryKind::Reader(reader) => reader,
        };

        let size = read_all(source, &mut data).map_err(|source| Error::Io {
            source,
            path: Some(PathBuf::from(&builder_entry.target)),
            context: "Reading entry data",
        })?;
        tracing::debug!("{}: {} bytes at {}", builder_entry.target, size, written);
        table.push(Entry::file(builder_entry.target, written, size));
        written = written
            .checked_add(size)
            .ok_or(Error::Core(tape_core::Error::Overflow))?;
    }
    Ok((table, data))
}

fn read_all(mut source: impl Read, data: &mut Vec<u8>) -> std::io::Result<u64> {
    let count = source.read_to_end(data)?;
    Ok(count as u64)
}

/// Random salt drawn from [`SALT_ALPHABET`]
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut rng = rand::thread_rng();
    let mut salt = [0; SALT_LEN];
    for byte in salt.iter_mut() {
        *byte = SALT_ALPHABET[rng.gen_range(0..SALT_ALPHABET.len())];
    }
    salt
}
