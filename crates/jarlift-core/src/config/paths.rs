//! Config path resolution helpers.

use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "jarlift.toml";

/// Candidate config files in lookup order: the working directory first, then
/// the user config directory.
pub fn config_file_candidates(project_root: &Path, global_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = vec![project_root.join(CONFIG_FILE_NAME)];
    if let Some(dir) = global_dir {
        candidates.push(dir.join(CONFIG_FILE_NAME));
    }
    candidates
}

/// `<config_dir>/jarlift`, when the platform has one.
pub fn global_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("jarlift"))
}
