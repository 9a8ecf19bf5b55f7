//! Results returned by deploy operations.

use std::path::PathBuf;

use serde::Serialize;

use crate::remote::CommandOutput;

/// One `<app>-<version>.jar` found in the installation root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledArtifact {
    pub path: PathBuf,
    pub file_name: String,
    pub version: String,
    /// Whether `current.jar` points here
    pub current: bool,
}

/// What a clean would do, computed before anything is deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPlan {
    /// Resolved target of `current.jar`
    pub current: PathBuf,
    /// Oldest first
    pub remove: Vec<InstalledArtifact>,
    pub keep: Vec<InstalledArtifact>,
}

impl CleanPlan {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    /// File names removed, oldest first
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
}

/// Outcome of stage → install → restart.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub staged: PathBuf,
    pub installed: PathBuf,
    pub restart: CommandOutput,
}
