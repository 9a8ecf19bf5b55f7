//! Remote operations over the system `ssh` and `scp` binaries.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;

use super::shell::{join, quote, quote_path, with_privilege};
use super::{CommandOutput, Privilege, Remote};
use crate::config::DeployConfig;

/// Runs every operation as a shell command line on `host`.
#[derive(Debug, Clone)]
pub struct SshRemote {
    host: String,
    user: Option<String>,
    port: Option<u16>,
    identity_file: Option<PathBuf>,
    ssh_program: String,
    scp_program: String,
}

impl SshRemote {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            port: None,
            identity_file: None,
            ssh_program: "ssh".to_string(),
            scp_program: "scp".to_string(),
        }
    }

    pub fn from_config(config: &DeployConfig) -> anyhow::Result<Self> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No host configured for the ssh transport"))?;
        let mut remote = Self::new(host);
        remote.user = config.ssh.user.clone();
        remote.port = config.ssh.port;
        remote.identity_file = config.ssh.identity_file.clone();
        Ok(remote)
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Override the `ssh`/`scp` executables.
    pub fn with_programs(mut self, ssh: impl Into<String>, scp: impl Into<String>) -> Self {
        self.ssh_program = ssh.into();
        self.scp_program = scp.into();
        self
    }

    /// `user@host`, or just `host` when no user is configured.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }

    /// Arguments for `ssh` running `remote_line` on the host.
    pub fn ssh_args(&self, remote_line: &str) -> Vec<String> {
        let mut args = vec!["-o".to_string(), "BatchMode=yes".to_string()];
        if let Some(port) = self.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        if let Some(identity) = &self.identity_file {
            args.push("-i".to_string());
            args.push(identity.to_string_lossy().to_string());
        }
        args.push(self.destination());
        args.push(remote_line.to_string());
        args
    }

    /// Arguments for `scp` copying `local` to `remote` on the host.
    pub fn scp_args(&self, local: &Path, remote: &Path) -> Vec<String> {
        let mut args = vec![
            "-q".to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
        ];
        if let Some(port) = self.port {
            args.push("-P".to_string());
            args.push(port.to_string());
        }
        if let Some(identity) = &self.identity_file {
            args.push("-i".to_string());
            args.push(identity.to_string_lossy().to_string());
        }
        args.push(local.to_string_lossy().to_string());
        args.push(format!("{}:{}", self.destination(), remote.display()));
        args
    }

    fn execute(&self, privilege: &Privilege, script: &str) -> anyhow::Result<CommandOutput> {
        let line = with_privilege(privilege, script);
        tracing::debug!(target_host = %self.destination(), %privilege, command = %line, "ssh");

        let output = Command::new(&self.ssh_program)
            .args(self.ssh_args(&line))
            .output()
            .with_context(|| format!("Failed to invoke {}", self.ssh_program))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            anyhow::bail!(
                "Command failed on {}: {}\n{}",
                self.destination(),
                line,
                if stderr.is_empty() {
                    output.status.to_string()
                } else {
                    stderr
                }
            );
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

impl Remote for SshRemote {
    fn describe(&self) -> String {
        self.destination()
    }

    fn run(&self, privilege: &Privilege, script: &str) -> anyhow::Result<CommandOutput> {
        self.execute(privilege, script)
    }

    fn upload(&self, local: &Path, temp_parent: &Path) -> anyhow::Result<PathBuf> {
        let file_name = local
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Upload source has no file name: {}", local.display()))?;

        let template = temp_parent.join("jarlift.XXXXXX");
        let script = format!(
            "d=$(mktemp -d {}) && chmod 0755 \"$d\" && printf '%s\\n' \"$d\"",
            quote_path(&template)
        );
        let temp_dir = self
            .execute(&Privilege::Login, &script)?
            .lines()
            .into_iter()
            .next()
            .map(PathBuf::from)
            .ok_or_else(|| anyhow::anyhow!("mktemp on {} printed nothing", self.destination()))?;
        let remote_path = temp_dir.join(file_name);

        tracing::debug!(
            local = %local.display(),
            remote = %remote_path.display(),
            "scp"
        );
        let output = Command::new(&self.scp_program)
            .args(self.scp_args(local, &remote_path))
            .output()
            .with_context(|| format!("Failed to invoke {}", self.scp_program))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            anyhow::bail!(
                "Failed to copy {} to {}:{}: {}",
                local.display(),
                self.destination(),
                remote_path.display(),
                stderr
            );
        }

        self.execute(
            &Privilege::Login,
            &format!("chmod 0644 {}", quote_path(&remote_path)),
        )?;
        Ok(remote_path)
    }

    fn read_link(&self, path: &Path) -> anyhow::Result<Option<PathBuf>> {
        let p = quote_path(path);
        let output = self.execute(
            &Privilege::Login,
            &format!("if [ -L {p} ]; then readlink {p}; fi"),
        )?;
        Ok(output.lines().into_iter().next().map(PathBuf::from))
    }

    fn exists(&self, path: &Path) -> anyhow::Result<bool> {
        let output = self.execute(
            &Privilege::Login,
            &format!(
                "if [ -e {} ]; then echo yes; else echo no; fi",
                quote_path(path)
            ),
        )?;
        Ok(output.stdout.trim() == "yes")
    }

    fn glob(
        &self,
        privilege: &Privilege,
        dir: &Path,
        pattern: &str,
    ) -> anyhow::Result<Vec<PathBuf>> {
        ensure_plain_pattern(pattern)?;
        let script = format!(
            "for f in {}/{}; do if [ -e \"$f\" ]; then printf '%s\\n' \"$f\"; fi; done",
            quote_path(dir),
            pattern
        );
        let mut paths: Vec<PathBuf> = self
            .execute(privilege, &script)?
            .lines()
            .into_iter()
            .map(PathBuf::from)
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn copy(&self, privilege: &Privilege, from: &Path, to: &Path) -> anyhow::Result<()> {
        self.execute(
            privilege,
            &format!("cp -- {} {}", quote_path(from), quote_path(to)),
        )?;
        Ok(())
    }

    fn remove(&self, privilege: &Privilege, paths: &[PathBuf]) -> anyhow::Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let words = ["rm", "-f", "--"]
            .into_iter()
            .map(str::to_string)
            .chain(paths.iter().map(|p| p.to_string_lossy().to_string()));
        self.execute(privilege, &join(words))?;
        Ok(())
    }

    fn remove_dir(&self, privilege: &Privilege, dir: &Path) -> anyhow::Result<()> {
        self.execute(privilege, &format!("rmdir -- {}", quote_path(dir)))?;
        Ok(())
    }

    fn symlink(&self, privilege: &Privilege, target: &Path, link: &Path) -> anyhow::Result<()> {
        let tmp = temp_link_path(link)?;
        self.execute(
            privilege,
            &format!(
                "ln -sfn {} {} && mv -fT {} {}",
                quote_path(target),
                quote_path(&tmp),
                quote_path(&tmp),
                quote_path(link)
            ),
        )?;
        Ok(())
    }
}

/// Sibling of `link` used to stage the replacement symlink.
pub(crate) fn temp_link_path(link: &Path) -> anyhow::Result<PathBuf> {
    let parent = link
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Link path has no parent: {}", link.display()))?;
    let base = link
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Link path has no filename: {}", link.display()))?;
    Ok(parent.join(format!(
        ".{}.tmp.{}",
        base.to_string_lossy(),
        std::process::id()
    )))
}

/// Glob patterns are spliced unquoted, so only file-name characters and
/// wildcards are allowed.
fn ensure_plain_pattern(pattern: &str) -> anyhow::Result<()> {
    if pattern.is_empty()
        || !pattern
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '*' | '?'))
    {
        anyhow::bail!("Unsupported glob pattern: {}", quote(pattern));
    }
    Ok(())
}
