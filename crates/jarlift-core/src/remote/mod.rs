//! Host-side effects: command execution, file transfer and filesystem edits.
//!
//! [`Remote`] is the seam between the deploy task and the machine being
//! deployed to. [`SshRemote`] drives the system `ssh`/`scp` binaries;
//! [`LocalRemote`] applies the same operations to the local filesystem.

pub mod local;
pub mod shell;
pub mod ssh;

use std::fmt;
use std::path::{Path, PathBuf};

pub use local::LocalRemote;
pub use ssh::SshRemote;

/// Identity a host-side operation runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Privilege {
    /// The account used to connect.
    Login,
    /// `sudo -u <name>`
    User(String),
    /// `sudo`
    Root,
}

impl Privilege {
    pub fn user(name: impl Into<String>) -> Self {
        Privilege::User(name.into())
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Privilege::Login => f.write_str("login"),
            Privilege::User(name) => write!(f, "user:{name}"),
            Privilege::Root => f.write_str("root"),
        }
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Non-empty stdout lines, trimmed.
    pub fn lines(&self) -> Vec<String> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Operations the deploy task needs from the target host.
///
/// Every method fails with the command line and its stderr when the host
/// reports an error. Nothing is retried.
pub trait Remote {
    /// Human-readable target, e.g. `deploy@app1`.
    fn describe(&self) -> String;

    /// Run a shell command line.
    fn run(&self, privilege: &Privilege, script: &str) -> anyhow::Result<CommandOutput>;

    /// Copy a local file into a fresh directory under `temp_parent`.
    ///
    /// Returns the remote path of the copy. The copy and its directory are
    /// readable by every account on the host so another identity can pick it
    /// up.
    fn upload(&self, local: &Path, temp_parent: &Path) -> anyhow::Result<PathBuf>;

    /// Target of the symlink at `path`, or `None` when `path` is not a symlink.
    fn read_link(&self, path: &Path) -> anyhow::Result<Option<PathBuf>>;

    /// Whether `path` exists (following symlinks).
    fn exists(&self, path: &Path) -> anyhow::Result<bool>;

    /// Entries of `dir` whose file name matches `pattern` (`*` and `?`
    /// wildcards). A missing directory yields no matches.
    fn glob(&self, privilege: &Privilege, dir: &Path, pattern: &str)
    -> anyhow::Result<Vec<PathBuf>>;

    fn copy(&self, privilege: &Privilege, from: &Path, to: &Path) -> anyhow::Result<()>;

    /// Delete files; paths that are already gone are ignored.
    fn remove(&self, privilege: &Privilege, paths: &[PathBuf]) -> anyhow::Result<()>;

    /// Delete an empty directory.
    fn remove_dir(&self, privilege: &Privilege, dir: &Path) -> anyhow::Result<()>;

    /// Point `link` at `target`, replacing any existing link in one rename.
    fn symlink(&self, privilege: &Privilege, target: &Path, link: &Path) -> anyhow::Result<()>;
}

/// Resolve a symlink target relative to the directory holding the link.
pub fn resolve_link_target(link: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        return target.to_path_buf();
    }
    match link.parent() {
        Some(parent) => parent.join(target),
        None => target.to_path_buf(),
    }
}
