//! Remote operations applied to this machine's filesystem.
//!
//! Privilege is not escalated: every operation runs as the current process.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;

use super::ssh::temp_link_path;
use super::{CommandOutput, Privilege, Remote};

#[derive(Debug, Clone, Default)]
pub struct LocalRemote;

impl LocalRemote {
    pub fn new() -> Self {
        Self
    }
}

impl Remote for LocalRemote {
    fn describe(&self) -> String {
        "localhost".to_string()
    }

    fn run(&self, privilege: &Privilege, script: &str) -> anyhow::Result<CommandOutput> {
        tracing::debug!(%privilege, command = %script, "sh -c");
        let output = Command::new("sh")
            .arg("-c")
            .arg(script)
            .output()
            .context("Failed to invoke sh")?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            anyhow::bail!(
                "Command failed: {}\n{}",
                script,
                if stderr.is_empty() {
                    output.status.to_string()
                } else {
                    stderr
                }
            );
        }
        Ok(CommandOutput { stdout, stderr })
    }

    fn upload(&self, local: &Path, temp_parent: &Path) -> anyhow::Result<PathBuf> {
        let file_name = local
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Upload source has no file name: {}", local.display()))?;
        let temp_dir = unique_temp_dir(temp_parent)?;
        fs::create_dir_all(&temp_dir)
            .with_context(|| format!("Failed to create temp directory: {}", temp_dir.display()))?;

        let dest = temp_dir.join(file_name);
        fs::copy(local, &dest).with_context(|| {
            format!("Failed to copy {} to {}", local.display(), dest.display())
        })?;
        set_readable(&temp_dir, 0o755)?;
        set_readable(&dest, 0o644)?;
        Ok(dest)
    }

    fn read_link(&self, path: &Path) -> anyhow::Result<Option<PathBuf>> {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let target = fs::read_link(path)
                    .with_context(|| format!("Failed to read link: {}", path.display()))?;
                Ok(Some(target))
            }
            Ok(_) => Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("Failed to stat {}", path.display()))),
        }
    }

    fn exists(&self, path: &Path) -> anyhow::Result<bool> {
        Ok(path.exists())
    }

    fn glob(
        &self,
        privilege: &Privilege,
        dir: &Path,
        pattern: &str,
    ) -> anyhow::Result<Vec<PathBuf>> {
        tracing::debug!(%privilege, dir = %dir.display(), pattern, "glob");
        let matcher = glob::Pattern::new(pattern)
            .with_context(|| format!("Invalid glob pattern: {pattern}"))?;

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("Failed to list directory: {}", dir.display())));
            }
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            if matcher.matches(&name.to_string_lossy()) && entry.path().exists() {
                paths.push(entry.path());
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn copy(&self, _privilege: &Privilege, from: &Path, to: &Path) -> anyhow::Result<()> {
        fs::copy(from, to)
            .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
        Ok(())
    }

    fn remove(&self, _privilege: &Privilege, paths: &[PathBuf]) -> anyhow::Result<()> {
        for path in paths {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(anyhow::Error::new(err)
                        .context(format!("Failed to remove {}", path.display())));
                }
            }
        }
        Ok(())
    }

    fn remove_dir(&self, _privilege: &Privilege, dir: &Path) -> anyhow::Result<()> {
        fs::remove_dir(dir)
            .with_context(|| format!("Failed to remove directory: {}", dir.display()))
    }

    fn symlink(&self, _privilege: &Privilege, target: &Path, link: &Path) -> anyhow::Result<()> {
        let tmp = temp_link_path(link)?;
        let _ = fs::remove_file(&tmp);

        create_symlink(target, &tmp)
            .with_context(|| format!("Failed to create symlink: {}", tmp.display()))?;
        if let Err(err) = fs::rename(&tmp, link) {
            let _ = fs::remove_file(&tmp);
            return Err(anyhow::Error::new(err).context(format!(
                "Failed to move temp link {} into {}",
                tmp.display(),
                link.display()
            )));
        }
        Ok(())
    }
}

fn unique_temp_dir(parent: &Path) -> anyhow::Result<PathBuf> {
    for attempt in 0u32..1000 {
        let name = if attempt == 0 {
            format!("jarlift.{}", std::process::id())
        } else {
            format!("jarlift.{}.{}", std::process::id(), attempt)
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    anyhow::bail!(
        "Failed to allocate a unique temp directory under {}",
        parent.display()
    );
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(unix)]
fn set_readable(path: &Path, mode: u32) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_readable(_path: &Path, _mode: u32) -> anyhow::Result<()> {
    Ok(())
}
