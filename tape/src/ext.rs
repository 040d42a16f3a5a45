//! Extention traits for base types defined in `tape-core`.
use std::path::{Component, Path};

use tape_core::Entry;

use crate::Error;

pub trait EntryExt {
    fn check_path(&self) -> Result<&Path, Error>;
}

impl EntryExt for Entry {
    /// Iterate the components of the path and ensure that there are no
    /// non-normal components.
    fn check_path(&self) -> Result<&Path, Error> {
        check_path(self.path())
    }
}

/// Accept only relative paths made of normal components, so that nothing
/// can land outside of the directory it is joined onto.
pub fn check_path(path: &str) -> Result<&Path, Error> {
    let path = Path::new(path);
    // An empty path would resolve to the base directory itself
    if path.components().next().is_none() {
        return Err(Error::InvalidPath {
            entry: path.to_path_buf(),
            component: path.to_path_buf(),
        });
    }
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            invalid => {
                let bad_component: &Path = invalid.as_ref();
                return Err(Error::InvalidPath {
                    entry: path.to_path_buf(),
                    component: bad_component.to_path_buf(),
                });
            }
        }
    }
    Ok(path)
}
