//! Config store for locating and loading jarlift.toml.

use std::path::{Path, PathBuf};

use super::{ConfigFile, DeployConfig, parser, paths};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: Option<PathBuf>,
}

impl ConfigStore {
    /// Use an explicit config file; it must exist.
    pub fn from_path(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if !path.is_file() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        Ok(Self {
            config_path: Some(path),
        })
    }

    /// Look for `./jarlift.toml`, then `<config_dir>/jarlift/jarlift.toml`.
    pub fn discover() -> anyhow::Result<Self> {
        let project_root = std::env::current_dir()?;
        let global_dir = paths::global_config_dir();
        Ok(Self::discover_in(&project_root, global_dir.as_deref()))
    }

    pub fn discover_in(project_root: &Path, global_dir: Option<&Path>) -> Self {
        let config_path = paths::config_file_candidates(project_root, global_dir)
            .into_iter()
            .find(|candidate| candidate.is_file());
        Self { config_path }
    }

    /// A store with no file; everything comes from defaults and overrides.
    pub fn empty() -> Self {
        Self { config_path: None }
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn load(&self) -> anyhow::Result<ConfigFile> {
        match &self.config_path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                parser::parse_config_file(path)
            }
            None => Ok(ConfigFile::default()),
        }
    }

    /// Load the file, apply `overrides`, fill defaults and validate.
    pub fn resolve(&self, overrides: ConfigFile) -> anyhow::Result<DeployConfig> {
        self.load()?.merge(overrides).resolve()
    }
}
