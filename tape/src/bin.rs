use std::fs;
use std::io::Write;
use std::path::Path;

use tape_core::Entry;

use crate::{wrap_io_err, Error, PackOptions, Summary};

/// Pack `roots` into a new archive at `archive_path`, replacing any existing
/// file. The archive is written to a temporary file next to the target and
/// renamed into place, so a failure never leaves a partial archive behind.
/// Returns the size of the archive.
pub fn create(
    archive_path: impl AsRef<Path>,
    roots: &[impl AsRef<Path>],
    options: &PackOptions,
) -> Result<u64, Error> {
    let archive_path = archive_path.as_ref();
    let bytes = crate::pack(roots, options)?;

    let parent = match archive_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".tape.")
        .tempfile_in(parent)
        .map_err(wrap_io_err!(parent, "Creating temporary archive"))?;
    tmp.write_all(&bytes)
        .map_err(wrap_io_err!(tmp.path(), "Writing archive"))?;
    tmp.persist(archive_path)
        .map_err(|err| Error::Io {
            source: err.error,
            path: Some(archive_path.to_path_buf()),
            context: "Renaming archive into place",
        })?;

    tracing::info!("wrote {} ({} bytes)", archive_path.display(), bytes.len());
    Ok(bytes.len() as u64)
}

/// Extract the archive at `archive_path` into the existing directory `dst`.
/// Returns the extracted entries in table order.
pub fn extract_file(
    archive_path: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<Vec<Entry>, Error> {
    let bytes = read_archive(archive_path.as_ref())?;
    crate::extract(&bytes, dst, password)
}

pub fn list_file(archive_path: impl AsRef<Path>) -> Result<Summary, Error> {
    let bytes = read_archive(archive_path.as_ref())?;
    crate::list(&bytes)
}

fn read_archive(archive_path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(archive_path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(archive_path.to_path_buf()),
        _ => Error::Io {
            source: err,
            path: Some(archive_path.to_path_buf()),
            context: "Reading archive",
        },
    })
}
