use std::path::{Path, PathBuf};

use thiserror::Error;

/// The `current.jar` pointer could not be resolved to a file.
///
/// Always fatal: the deploy task stops as soon as it sees one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PointerError {
    /// No symlink exists at the pointer location.
    #[error("expected {} to point to a file, but it is not a symlink", .link.display())]
    Missing { link: PathBuf },

    /// The symlink exists but its target is gone.
    #[error(
        "expected {} to point to a file, but its target {} does not exist",
        .link.display(),
        .target.display()
    )]
    Dangling { link: PathBuf, target: PathBuf },
}

impl PointerError {
    pub fn link(&self) -> &Path {
        match self {
            PointerError::Missing { link } | PointerError::Dangling { link, .. } => link.as_path(),
        }
    }
}
