//! Turn root paths given on the command line into an ordered manifest.
//!
//! A root like `some/where/dir` is split into the prefix `some/where/` and the
//! leaf `dir`. Only the leaf (and whatever is below it) is recorded in the
//! archive; the prefix is only used to find the files on disk.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::{wrap_io_err, Error};

const SEPARATOR: char = '/';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Directory,
}

/// One manifest row before any data has been read
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceEntry {
    pub kind: SourceKind,
    /// Directory the root was given relative to, ending with a separator
    /// unless empty
    pub prefix: PathBuf,
    /// Path recorded in the archive. Directories end with `/`.
    pub archive_path: String,
}

impl SourceEntry {
    /// Location of this entry on disk
    pub fn source(&self) -> PathBuf {
        self.prefix.join(&self.archive_path)
    }
}

/// Split a root into `(prefix, leaf)` at the last separator. Trailing
/// separators stay with the leaf.
///
/// ```
/// use tape::resolve::split_root;
///
/// assert_eq!(split_root("a.txt").unwrap(), ("", "a.txt"));
/// assert_eq!(split_root("a/b/dir/").unwrap(), ("a/b/", "dir/"));
/// ```
pub fn split_root(root: &str) -> Result<(&str, &str), Error> {
    let trimmed = root.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        return Err(Error::InvalidPath {
            entry: PathBuf::from(root),
            component: PathBuf::from(root),
        });
    }
    Ok(match trimmed.rfind(SEPARATOR) {
        Some(index) => root.split_at(index + 1),
        None => ("", root),
    })
}

/// Resolve every root, in order, into a single manifest. Fails on the first
/// root that cannot be resolved; nothing is returned in that case.
pub fn resolve<P: AsRef<Path>>(roots: &[P], recursive: bool) -> Result<Vec<SourceEntry>, Error> {
    let mut manifest = Vec::new();
    for root in roots {
        resolve_root(root.as_ref(), recursive, &mut manifest)?;
    }
    Ok(manifest)
}

/// Resolve a single root, appending its entries to `manifest` in pre-order.
///
/// A leaf of `.` or `..` is replaced by the real name of the directory it
/// points to. A leaf with a trailing separator must be a directory.
pub fn resolve_root(
    root: &Path,
    recursive: bool,
    manifest: &mut Vec<SourceEntry>,
) -> Result<(), Error> {
    let invalid = || Error::InvalidPath {
        entry: root.to_path_buf(),
        component: root.to_path_buf(),
    };
    let root_str = root.to_str().ok_or_else(invalid)?;
    let (prefix, leaf) = split_root(root_str)?;
    let wants_dir = leaf.ends_with(SEPARATOR);
    let leaf = leaf.trim_end_matches(SEPARATOR);

    let (prefix, leaf) = match leaf {
        "." | ".." => {
            let real = fs::canonicalize(root).map_err(|err| not_found(root, err))?;
            let parent = real.parent().and_then(Path::to_str).ok_or_else(invalid)?;
            let name = real
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(invalid)?;
            let parent = if parent.ends_with(SEPARATOR) {
                parent.to_string()
            } else {
                format!("{}{}", parent, SEPARATOR)
            };
            (PathBuf::from(parent), name.to_string())
        }
        _ => (PathBuf::from(prefix), leaf.to_string()),
    };

    if wants_dir && !metadata(&prefix.join(&leaf))?.is_dir() {
        return Err(Error::NotFound(root.to_path_buf()));
    }

    let start = manifest.len();
    visit(&prefix, leaf, recursive, manifest)?;
    tracing::debug!(
        "resolved {} into {} entries",
        root.display(),
        manifest.len() - start
    );
    Ok(())
}

fn not_found(path: &Path, err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
        _ => Error::Io {
            source: err,
            path: Some(path.to_path_buf()),
            context: "Reading metadata",
        },
    }
}

// Follows symlinks
fn metadata(path: &Path) -> Result<fs::Metadata, Error> {
    fs::metadata(path).map_err(|err| not_found(path, err))
}

fn visit(
    prefix: &Path,
    archive_path: String,
    recursive: bool,
    manifest: &mut Vec<SourceEntry>,
) -> Result<(), Error> {
    let path = prefix.join(&archive_path);
    let metadata = metadata(&path)?;

    if metadata.is_file() {
        manifest.push(SourceEntry {
            kind: SourceKind::File,
            prefix: prefix.to_path_buf(),
            archive_path,
        });
    } else if metadata.is_dir() {
        let dir_path = format!("{}{}", archive_path, SEPARATOR);
        manifest.push(SourceEntry {
            kind: SourceKind::Directory,
            prefix: prefix.to_path_buf(),
            archive_path: dir_path.clone(),
        });
        if recursive {
            for name in sorted_children(&path)? {
                visit(prefix, format!("{}{}", dir_path, name), recursive, manifest)?;
            }
        }
    } else {
        return Err(Error::UnsupportedFileType(path));
    }
    Ok(())
}

/// Names of the entries of `dir`, sorted by their bytes
fn sorted_children(dir: &Path) -> Result<Vec<String>, Error> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(wrap_io_err!(dir, "Reading directory"))? {
        let entry = entry.map_err(wrap_io_err!(dir, "Reading directory entry"))?;
        let name = entry.file_name();
        match name.into_string() {
            Ok(name) => names.push(name),
            Err(name) => {
                return Err(Error::InvalidPath {
                    entry: dir.join(&name),
                    component: PathBuf::from(name),
                })
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::{resolve, split_root, SourceEntry, SourceKind};
    use crate::Error;

    fn names(manifest: &[SourceEntry]) -> Vec<&str> {
        manifest.iter().map(|e| e.archive_path.as_str()).collect()
    }

    fn tree() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), b"hi").unwrap();
        fs::create_dir_all(tmp.path().join("b/d")).unwrap();
        fs::write(tmp.path().join("b/c.txt"), b"yo").unwrap();
        fs::write(tmp.path().join("b/d/e"), b"").unwrap();
        fs::write(tmp.path().join("b/a"), b"!").unwrap();
        tmp
    }

    #[test]
    fn split() {
        assert_eq!(split_root("file").unwrap(), ("", "file"));
        assert_eq!(split_root("dir/").unwrap(), ("", "dir/"));
        assert_eq!(split_root("a/b/file").unwrap(), ("a/b/", "file"));
        assert_eq!(split_root("a/b/dir//").unwrap(), ("a/b/", "dir//"));
        assert_eq!(split_root("/abs/file").unwrap(), ("/abs/", "file"));
        assert_eq!(split_root("/top").unwrap(), ("/", "top"));
        assert!(matches!(split_root("/"), Err(Error::InvalidPath { .. })));
        assert!(matches!(split_root(""), Err(Error::InvalidPath { .. })));
    }

    #[test]
    fn recursive_is_preorder_and_sorted() {
        let tmp = tree();
        let roots = [tmp.path().join("a.txt"), tmp.path().join("b")];
        let manifest = resolve(&roots, true).unwrap();

        assert_eq!(
            names(&manifest),
            ["a.txt", "b/", "b/a", "b/c.txt", "b/d/", "b/d/e"]
        );
        for entry in &manifest {
            let expected = if entry.archive_path.ends_with('/') {
                SourceKind::Directory
            } else {
                SourceKind::File
            };
            assert_eq!(entry.kind, expected);
            assert_eq!(entry.prefix, PathBuf::from(format!("{}/", tmp.path().display())));
            assert!(entry.source().exists());
        }
    }

    #[test]
    fn non_recursive_keeps_only_the_directory() {
        let tmp = tree();
        let root = format!("{}/b/", tmp.path().display());
        let manifest = resolve(&[root], false).unwrap();
        assert_eq!(names(&manifest), ["b/"]);
    }

    #[test]
    fn missing_root_aborts() {
        let tmp = tree();
        let roots = [tmp.path().join("a.txt"), tmp.path().join("nope")];
        match resolve(&roots, true) {
            Err(Error::NotFound(path)) => assert_eq!(path, tmp.path().join("nope")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn follows_symlinks() {
        let tmp = tree();
        std::os::unix::fs::symlink(tmp.path().join("a.txt"), tmp.path().join("b/link")).unwrap();
        let manifest = resolve(&[tmp.path().join("b")], true).unwrap();
        let link = manifest
            .iter()
            .find(|e| e.archive_path == "b/link")
            .unwrap();
        assert_eq!(link.kind, SourceKind::File);
        assert_eq!(fs::read(link.source()).unwrap(), b"hi");
    }

    #[test]
    fn dot_roots_use_the_real_directory_name() {
        let tmp = tree();
        let dot = format!("{}/b/.", tmp.path().display());
        let manifest = resolve(&[dot], true).unwrap();
        assert_eq!(names(&manifest), ["b/", "b/a", "b/c.txt", "b/d/", "b/d/e"]);
        assert!(manifest.iter().all(|e| e.source().exists()));

        let up = format!("{}/b/d/../", tmp.path().display());
        let manifest = resolve(&[up], false).unwrap();
        assert_eq!(names(&manifest), ["b/"]);
    }

    #[test]
    fn trailing_separator_requires_a_directory() {
        let tmp = tree();
        let root = format!("{}/a.txt/", tmp.path().display());
        match resolve(&[root.as_str()], true) {
            Err(Error::NotFound(path)) => assert_eq!(path, Path::new(&root)),
            other => panic!("expected NotFound, got {:?}", other),
        }
        let root = format!("{}/b/d/", tmp.path().display());
        assert_eq!(names(&resolve(&[root], true).unwrap()), ["d/", "d/e"]);
    }

    #[test]
    fn root_only_slashes() {
        assert!(matches!(
            resolve(&[Path::new("/")], true),
            Err(Error::InvalidPath { .. })
        ));
    }
}
