use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tape_core::EntryKind;

use crate::ext::EntryExt;
use crate::{Container, Error};

enum Action<'a> {
    /// Existing directories are left alone
    CreateDir(PathBuf),
    /// Create or overwrite the target with these bytes
    Write(PathBuf, &'a [u8]),
}

impl Action<'_> {
    fn commit(&self) -> io::Result<()> {
        match self {
            Action::CreateDir(target) => match fs::create_dir(target) {
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists && target.is_dir() => Ok(()),
                result => result,
            },
            Action::Write(target, data) => fs::write(target, data),
        }
    }

    fn target(&self) -> &Path {
        match self {
            Action::CreateDir(target) | Action::Write(target, _) => target,
        }
    }
}

/// Filesystem changes needed to extract a container, planned up front so
/// that every entry is validated before anything is written.
pub struct Transaction<'a> {
    actions: VecDeque<Action<'a>>,
}

impl<'a> Transaction<'a> {
    /// Plan the extraction of `container` into `base_dir`, which must be an
    /// existing directory. Nothing on disk is modified.
    pub fn extract(
        container: &'a Container,
        base_dir: impl AsRef<Path>,
    ) -> Result<Transaction<'a>, Error> {
        let base_dir = base_dir.as_ref();
        if !base_dir.is_dir() {
            return Err(Error::NotFound(base_dir.to_path_buf()));
        }

        let mut actions = VecDeque::with_capacity(container.entries().len());
        for entry in container.entries() {
            let relative_path = entry.check_path()?;
            let target_path = base_dir.join(relative_path);

            actions.push_back(match entry.kind {
                EntryKind::Directory => Action::CreateDir(target_path),
                EntryKind::File { .. } => Action::Write(target_path, container.entry_data(entry)?),
            });
        }
        Ok(Transaction { actions })
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Apply the planned actions in order. On failure the failed action and
    /// everything after it stay in the transaction, so a commit can be
    /// retried once the cause is fixed. Applied actions are not undone.
    /// `remaining` in the error counts the failed action.
    pub fn commit(&mut self) -> Result<usize, Error> {
        let mut count = 0;
        while let Some(action) = self.actions.pop_front() {
            if let Err(err) = action.commit() {
                let path = action.target().to_path_buf();
                self.actions.push_front(action);
                return Err(Error::FailedCommit {
                    changed: count,
                    remaining: self.actions.len(),
                    path,
                    source: err,
                });
            }
            tracing::debug!("extracted {}", action.target().display());
            count += 1;
        }
        Ok(count)
    }
}
