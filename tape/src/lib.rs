//! Pack files and directories into a single tape container, and list or
//! extract them again.
//!
//! The container format itself lives in `tape-core`; this crate adds the
//! filesystem side: resolving roots into a manifest, compression and
//! obfuscation of the payload, and extraction through a [`Transaction`].
mod bin;
mod builder;
pub mod compress;
pub mod ext;
mod package;
pub mod resolve;
mod summary;
mod transaction;

pub use bin::*;
pub use builder::*;
pub use package::*;
pub use summary::*;
pub use transaction::*;

pub use tape_core::{CompressionMethod, Entry, EntryKind, Header, Version, VERSION};

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Maps an `io::Error` into [`Error::Io`] with an optional path and a short
/// description of what was being done.
#[macro_export]
macro_rules! wrap_io_err {
    ($path:expr, $context:expr) => {
        |source| $crate::Error::Io {
            source,
            path: Some(::std::path::PathBuf::from(&$path)),
            context: $context,
        }
    };
    ($context:expr) => {
        |source| $crate::Error::Io {
            source,
            path: None,
            context: $context,
        }
    };
}

#[derive(thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tape_core::Error),

    #[error("{context}{}", display_path(.path))]
    Io {
        #[source]
        source: io::Error,
        path: Option<PathBuf>,
        context: &'static str,
    },

    #[error("No such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid path component '{}' in '{}'", .component.display(), .entry.display())]
    InvalidPath { entry: PathBuf, component: PathBuf },

    #[error("Unsupported file type: {}", .0.display())]
    UnsupportedFileType(PathBuf),

    #[error("Archive is encrypted but no password was given")]
    PasswordRequired,

    #[error("Archive is not encrypted but a password was given")]
    UnexpectedPassword,

    #[error("Wrong password")]
    WrongPassword,

    #[error("Corrupt {method} payload")]
    CorruptPayload {
        method: CompressionMethod,
        #[source]
        source: io::Error,
    },

    #[error("Compression method {0} is not available in this build")]
    UnsupportedMethod(CompressionMethod),

    #[error(
        "Failed to commit transaction at {}: {changed} actions applied, {remaining} remaining",
        .path.display()
    )]
    FailedCommit {
        changed: usize,
        remaining: usize,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(": {}", path.display()),
        None => String::new(),
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")?;

        let mut source = self.source();
        while let Some(err) = source {
            writeln!(f, "\tCaused by: {err}")?;
            source = err.source();
        }

        Ok(())
    }
}

/// Pack `roots` into container bytes
pub fn pack<P: AsRef<Path>>(roots: &[P], options: &PackOptions) -> Result<Vec<u8>, Error> {
    let mut builder = TapeBuilder::new(options.clone());
    for root in roots {
        builder.add_root(root)?;
    }
    builder.to_bytes()
}

/// Summarize container bytes without decoding the payload
pub fn list(bytes: &[u8]) -> Result<Summary, Error> {
    let (header, _) = Header::parse(bytes)?;
    Ok(Summary::new(&header))
}

/// Decode container bytes and recreate the archived tree under `destination`.
/// Returns the extracted entries in table order.
pub fn extract(
    bytes: &[u8],
    destination: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<Vec<Entry>, Error> {
    let container = Container::from_bytes(bytes, password)?;
    Transaction::extract(&container, destination)?.commit()?;
    Ok(container.into_entries())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::PathBuf;

    use super::Error;

    #[test]
    fn io_error_display() {
        let err = Error::Io {
            source: io::Error::new(io::ErrorKind::Other, "boom"),
            path: Some(PathBuf::from("some/file")),
            context: "Reading file",
        };
        assert_eq!(err.to_string(), "Reading file: some/file");
        assert_eq!(
            format!("{:?}", err),
            "Reading file: some/file\n\tCaused by: boom\n"
        );

        let wrap = crate::wrap_io_err!("Writing");
        let err: Error = wrap(io::Error::new(io::ErrorKind::Other, "x"));
        assert_eq!(err.to_string(), "Writing");
    }

    #[test]
    fn core_errors_are_transparent() {
        let err = Error::from(tape_core::Error::NotATapeFile);
        assert_eq!(err.to_string(), "Not a tape file");
    }
}
