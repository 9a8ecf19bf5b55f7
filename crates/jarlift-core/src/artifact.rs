//! Versioned jar artifacts named `<app>-<version>.jar`.

use std::path::{Path, PathBuf};

use anyhow::Context;

pub const ARTIFACT_EXTENSION: &str = ".jar";

/// Extract the version from an artifact file name.
///
/// Accepts a bare file name or a full path; only the final component is
/// inspected. Returns `None` when the name is not `<app>-<version>.jar` or the
/// version part is empty.
pub fn convert_to_version(app: &str, filename: &str) -> Option<String> {
    let base = Path::new(filename).file_name()?.to_str()?;
    let version = base
        .strip_prefix(app)?
        .strip_prefix('-')?
        .strip_suffix(ARTIFACT_EXTENSION)?;
    if version.is_empty() {
        return None;
    }
    Some(version.to_string())
}

/// File name for a given app and version.
pub fn artifact_file_name(app: &str, version: &str) -> String {
    format!("{app}-{version}{ARTIFACT_EXTENSION}")
}

/// Glob pattern matching every installed artifact of an app.
pub fn artifact_pattern(app: &str) -> String {
    format!("{app}-*{ARTIFACT_EXTENSION}")
}

/// A local jar file about to be deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    file_name: String,
    version: String,
}

impl Artifact {
    /// Validate that `path` names an artifact of `app`.
    ///
    /// Only the name is checked here; whether the file exists is up to the
    /// caller.
    pub fn from_path(app: &str, path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .with_context(|| format!("Artifact path has no file name: {}", path.display()))?;
        let version = convert_to_version(app, &file_name).ok_or_else(|| {
            anyhow::anyhow!(
                "Artifact name '{}' does not match {}",
                file_name,
                artifact_pattern(app)
            )
        })?;

        Ok(Self {
            path,
            file_name,
            version,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
