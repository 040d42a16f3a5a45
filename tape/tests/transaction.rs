use std::error::Error as StdError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tape::{CompressionMethod, Container, Entry, Error, Header, PackOptions, TapeBuilder, Transaction};

struct TestDir {
    tmpdir: tempfile::TempDir,
}

impl TestDir {
    fn new() -> io::Result<TestDir> {
        Ok(TestDir {
            tmpdir: tempfile::tempdir()?,
        })
    }

    fn dir(&self, path: impl AsRef<Path>) -> PathBuf {
        self.tmpdir.path().join(path)
    }

    fn file(&self, path: impl AsRef<Path>) -> PathBuf {
        self.tmpdir.path().join(path)
    }

    fn is_empty(&self, path: impl AsRef<Path>) -> io::Result<bool> {
        Ok(fs::read_dir(self.dir(path))?.next().is_none())
    }
}

/// A small tree with nested directories and an empty file
fn buildroot(tmp: &TestDir) -> io::Result<()> {
    fs::create_dir_all(tmp.dir("buildroot/src/nested"))?;
    fs::create_dir(tmp.dir("buildroot/empty"))?;
    fs::write(tmp.file("buildroot/README"), b"read me\n")?;
    fs::write(tmp.file("buildroot/src/lib.rs"), b"pub fn f() {}\n".repeat(50))?;
    fs::write(tmp.file("buildroot/src/nested/zero"), b"")?;
    Ok(())
}

fn assert_same_tree(a: &Path, b: &Path) {
    let mut names: Vec<_> = fs::read_dir(a)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    names.sort();
    let mut other: Vec<_> = fs::read_dir(b)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    other.sort();
    assert_eq!(names, other, "{} vs {}", a.display(), b.display());

    for name in names {
        let (a, b) = (a.join(&name), b.join(&name));
        if a.is_dir() {
            assert!(b.is_dir());
            assert_same_tree(&a, &b);
        } else {
            assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap(), "{}", a.display());
        }
    }
}

#[test]
fn round_trip_every_method_and_password() -> Result<(), Box<dyn StdError>> {
    let tmp = TestDir::new()?;
    buildroot(&tmp)?;

    for method in CompressionMethod::ALL {
        for password in [None, Some("any-string")] {
            let mut options = PackOptions::new().recursive(true).compression(method);
            if let Some(password) = password {
                options = options.password(password);
            }
            let archive = tmp.file(format!("{}-{}.tape", method, password.is_some()));
            tape::create(&archive, &[tmp.dir("buildroot")], &options)?;

            let installroot = tmp.dir(format!("install-{}-{}", method, password.is_some()));
            fs::create_dir(&installroot)?;
            let entries = tape::extract_file(&archive, &installroot, password)?;
            assert_eq!(entries.len(), 7);
            assert_eq!(entries[0].path(), "buildroot/");

            assert_same_tree(&tmp.dir("buildroot"), &installroot.join("buildroot"));
        }
    }
    Ok(())
}

#[test]
fn wrong_password_leaves_no_output() -> Result<(), Box<dyn StdError>> {
    let tmp = TestDir::new()?;
    buildroot(&tmp)?;
    let options = PackOptions::new().recursive(true).password("right");
    let archive = tape::pack(&[tmp.dir("buildroot")], &options)?;

    fs::create_dir(tmp.dir("out"))?;
    for (password, expected) in [(Some("wrong"), "WrongPassword"), (None, "PasswordRequired")] {
        let err = tape::extract(&archive, tmp.dir("out"), password).unwrap_err();
        match (&err, expected) {
            (Error::WrongPassword, "WrongPassword") | (Error::PasswordRequired, "PasswordRequired") => {}
            _ => panic!("expected {}, got {:?}", expected, err),
        }
        assert!(tmp.is_empty("out")?);
    }
    Ok(())
}

#[test]
fn escaping_paths_are_rejected_before_writing() -> Result<(), Box<dyn StdError>> {
    let tmp = TestDir::new()?;
    let header = Header::new(
        vec![
            Entry::directory("fine/"),
            Entry::file("fine/ok", 0, 2),
            Entry::file("../escape", 2, 2),
        ],
        None,
        4,
        CompressionMethod::None,
    );
    let mut archive = header.to_bytes()?;
    archive.extend_from_slice(b"hiyo");

    fs::create_dir(tmp.dir("out"))?;
    match tape::extract(&archive, tmp.dir("out"), None) {
        Err(Error::InvalidPath { component, .. }) => assert_eq!(component, Path::new("..")),
        other => panic!("expected InvalidPath, got {:?}", other),
    }
    assert!(tmp.is_empty("out")?);
    assert!(!tmp.file("escape").exists());
    Ok(())
}

#[test]
fn duplicates_last_write_wins() -> Result<(), Box<dyn StdError>> {
    let tmp = TestDir::new()?;
    let mut builder = TapeBuilder::new(PackOptions::new());
    builder
        .file_reader(&b"first"[..], "same")?
        .dir("d")?
        .dir("d")?
        .file_reader(&b"second"[..], "same")?;
    let archive = builder.to_bytes()?;

    let container = Container::from_bytes(&archive, None)?;
    let mut transaction = Transaction::extract(&container, tmp.dir(""))?;
    assert_eq!(transaction.len(), 4);
    assert_eq!(transaction.commit()?, 4);
    assert!(transaction.is_empty());

    assert_eq!(fs::read(tmp.file("same"))?, b"second");
    assert!(tmp.dir("d").is_dir());
    Ok(())
}

#[test]
fn existing_directory_is_kept_existing_file_fails() -> Result<(), Box<dyn StdError>> {
    let tmp = TestDir::new()?;
    fs::create_dir(tmp.dir("d"))?;
    fs::write(tmp.file("d/keep"), b"untouched")?;
    fs::write(tmp.file("f"), b"a file")?;

    let mut builder = TapeBuilder::new(PackOptions::new());
    builder.dir("d")?.file_reader(&b"new"[..], "d/new")?;
    tape::extract(&builder.to_bytes()?, tmp.dir(""), None)?;
    assert_eq!(fs::read(tmp.file("d/keep"))?, b"untouched");
    assert_eq!(fs::read(tmp.file("d/new"))?, b"new");

    let mut builder = TapeBuilder::new(PackOptions::new());
    builder
        .file_reader(&b"x"[..], "before")?
        .dir("f")?
        .file_reader(&b"y"[..], "after")?;
    match tape::extract(&builder.to_bytes()?, tmp.dir(""), None) {
        Err(Error::FailedCommit {
            changed,
            remaining,
            path,
            ..
        }) => {
            assert_eq!(changed, 1);
            // The failed action stays queued
            assert_eq!(remaining, 2);
            assert_eq!(path, tmp.dir("f"));
        }
        other => panic!("expected FailedCommit, got {:?}", other),
    }
    // Partially applied, not rolled back
    assert!(tmp.file("before").exists());
    assert!(!tmp.file("after").exists());
    Ok(())
}

#[test]
fn parents_are_not_created() -> Result<(), Box<dyn StdError>> {
    let tmp = TestDir::new()?;
    let mut builder = TapeBuilder::new(PackOptions::new());
    builder.file_reader(&b"orphan"[..], "missing/parent")?;
    let archive = builder.to_bytes()?;

    assert!(matches!(
        tape::extract(&archive, tmp.dir(""), None),
        Err(Error::FailedCommit { changed: 0, .. })
    ));
    assert!(matches!(
        tape::extract(&archive, tmp.dir("no-such-dir"), None),
        Err(Error::NotFound(_))
    ));
    Ok(())
}

#[test]
fn failed_commit_can_be_retried() -> Result<(), Box<dyn StdError>> {
    let tmp = TestDir::new()?;
    let mut builder = TapeBuilder::new(PackOptions::new().compression(CompressionMethod::None));
    builder.file_reader(&b"data"[..], "later/file")?;
    let archive = builder.to_bytes()?;
    let container = Container::from_bytes(&archive, None)?;

    let mut transaction = Transaction::extract(&container, tmp.dir(""))?;
    assert!(transaction.commit().is_err());
    assert_eq!(transaction.len(), 1);

    fs::create_dir(tmp.dir("later"))?;
    assert_eq!(transaction.commit()?, 1);
    assert_eq!(fs::read(tmp.file("later/file"))?, b"data");
    Ok(())
}
