//! Configuration schema for jarlift.toml
//!
//! The file is a flat table plus an optional `[ssh]` section:
//!
//! ```toml
//! app = "bouncer"
//! host = "app1.example.com"
//! keep = 5
//!
//! [ssh]
//! user = "deploy"
//! port = 2222
//! ```
//!
//! Every key is optional. Missing keys fall back to the defaults derived from
//! `app` (see [`DeployConfig::for_app`]).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::artifact::{artifact_file_name, artifact_pattern};
use crate::version::VersionOrder;

pub const DEFAULT_APP: &str = "bouncer";
pub const CURRENT_LINK_NAME: &str = "current.jar";
pub const DEFAULT_KEEP: usize = 5;
pub const DEFAULT_TEMP_DIR: &str = "/tmp";

/// How host-side effects are carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// `ssh`/`scp` against `host`.
    Ssh,
    /// Operate on this machine's filesystem.
    Local,
}

impl Default for Transport {
    fn default() -> Self {
        Self::Ssh
    }
}

impl Transport {
    pub fn as_str(self) -> &'static str {
        match self {
            Transport::Ssh => "ssh",
            Transport::Local => "local",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ssh" => Ok(Transport::Ssh),
            "local" => Ok(Transport::Local),
            other => anyhow::bail!("Unknown transport: {}. Use 'ssh' or 'local'", other),
        }
    }
}

/// Raw contents of jarlift.toml, also used as the CLI override layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub app: Option<String>,

    #[serde(default)]
    pub host: Option<String>,

    /// Installation root (defaults to `/opt/<app>`)
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Account that owns staged artifacts (defaults to the app name)
    #[serde(default)]
    pub service_user: Option<String>,

    /// Non-current versions retained by clean
    #[serde(default)]
    pub keep: Option<usize>,

    /// Defaults to `/etc/init.d/<app> restart`
    #[serde(default)]
    pub restart_command: Option<String>,

    #[serde(default)]
    pub version_order: Option<VersionOrder>,

    #[serde(default)]
    pub transport: Option<Transport>,

    /// Where uploads land before they are copied into the root
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    #[serde(default)]
    pub ssh: SshSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshSection {
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub identity_file: Option<PathBuf>,
}

impl ConfigFile {
    /// Layer `overrides` on top of `self`; any value set in `overrides` wins.
    pub fn merge(self, overrides: ConfigFile) -> ConfigFile {
        ConfigFile {
            app: overrides.app.or(self.app),
            host: overrides.host.or(self.host),
            root: overrides.root.or(self.root),
            service_user: overrides.service_user.or(self.service_user),
            keep: overrides.keep.or(self.keep),
            restart_command: overrides.restart_command.or(self.restart_command),
            version_order: overrides.version_order.or(self.version_order),
            transport: overrides.transport.or(self.transport),
            temp_dir: overrides.temp_dir.or(self.temp_dir),
            ssh: SshSection {
                user: overrides.ssh.user.or(self.ssh.user),
                port: overrides.ssh.port.or(self.ssh.port),
                identity_file: overrides.ssh.identity_file.or(self.ssh.identity_file),
            },
        }
    }

    /// Fill in defaults and validate.
    pub fn resolve(self) -> anyhow::Result<DeployConfig> {
        let app = self.app.unwrap_or_else(|| DEFAULT_APP.to_string());
        let mut config = DeployConfig::for_app(app);

        config.host = self.host;
        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(user) = self.service_user {
            config.service_user = user;
        }
        if let Some(keep) = self.keep {
            config.keep = keep;
        }
        if let Some(command) = self.restart_command {
            config.restart_command = command;
        }
        if let Some(order) = self.version_order {
            config.version_order = order;
        }
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        if let Some(temp_dir) = self.temp_dir {
            config.temp_dir = temp_dir;
        }
        config.ssh = SshOptions {
            user: self.ssh.user,
            port: self.ssh.port,
            identity_file: self.ssh.identity_file,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Resolved deployment settings passed to the deploy task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployConfig {
    pub app: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub root: PathBuf,
    pub service_user: String,
    pub keep: usize,
    pub restart_command: String,
    pub version_order: VersionOrder,
    pub transport: Transport,
    pub temp_dir: PathBuf,
    pub ssh: SshOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SshOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,
}

impl DeployConfig {
    /// Defaults for `app`: root `/opt/<app>`, owned by `<app>`, restarted via
    /// its init script, keeping five old versions.
    pub fn for_app(app: impl Into<String>) -> Self {
        let app = app.into();
        Self {
            root: PathBuf::from("/opt").join(&app),
            service_user: app.clone(),
            keep: DEFAULT_KEEP,
            restart_command: format!("/etc/init.d/{app} restart"),
            version_order: VersionOrder::default(),
            transport: Transport::default(),
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            host: None,
            ssh: SshOptions::default(),
            app,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_keep(mut self, keep: usize) -> Self {
        self.keep = keep;
        self
    }

    pub fn with_restart_command(mut self, command: impl Into<String>) -> Self {
        self.restart_command = command.into();
        self
    }

    pub fn with_version_order(mut self, order: VersionOrder) -> Self {
        self.version_order = order;
        self
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// `<root>/current.jar`
    pub fn current_link(&self) -> PathBuf {
        self.root.join(CURRENT_LINK_NAME)
    }

    /// Where an artifact lands once staged: `<root>/<basename>`.
    pub fn deploy_path(&self, artifact: &Path) -> anyhow::Result<PathBuf> {
        let name = artifact
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Artifact path has no file name: {}", artifact.display()))?;
        Ok(self.root.join(name))
    }

    /// `<root>/<app>-<version>.jar`
    pub fn installed_path(&self, version: &str) -> PathBuf {
        self.root.join(artifact_file_name(&self.app, version))
    }

    pub fn artifact_pattern(&self) -> String {
        artifact_pattern(&self.app)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.app.is_empty() {
            anyhow::bail!("App name must not be empty");
        }
        if !self
            .app
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            anyhow::bail!(
                "Invalid app name '{}': use letters, digits, '-', '_' or '.'",
                self.app
            );
        }
        if self.app.chars().all(|c| c == '.') {
            anyhow::bail!("Invalid app name '{}': must not be only dots", self.app);
        }
        if !self.root.is_absolute() {
            anyhow::bail!("Root must be an absolute path: {}", self.root.display());
        }
        if !self.temp_dir.is_absolute() {
            anyhow::bail!(
                "Temp dir must be an absolute path: {}",
                self.temp_dir.display()
            );
        }
        if self.service_user.trim().is_empty() {
            anyhow::bail!("Service user must not be empty");
        }
        if self.restart_command.trim().is_empty() {
            anyhow::bail!("Restart command must not be empty");
        }
        if self.transport == Transport::Ssh
            && self.host.as_deref().is_none_or(|h| h.trim().is_empty())
        {
            anyhow::bail!("A host is required for the ssh transport (set `host` or pass --host)");
        }
        Ok(())
    }
}
