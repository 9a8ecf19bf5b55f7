//! Deploy task bound to one app on one host.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use console::style;

use crate::artifact::{Artifact, convert_to_version};
use crate::config::DeployConfig;
use crate::remote::{CommandOutput, Privilege, Remote, resolve_link_target};

use super::error::PointerError;
use super::inventory::{sort_installed, split_for_clean};
use super::report::{CleanPlan, CleanReport, InstalledArtifact, RunReport};

/// Sequences stage, install, restart and clean against a [`Remote`].
///
/// Operations run in the order they are called. Nothing is retried and a
/// failure part-way through `run` is not rolled back.
#[derive(Debug)]
pub struct DeployTask<R: Remote> {
    config: DeployConfig,
    remote: R,
}

impl<R: Remote> DeployTask<R> {
    pub fn new(config: DeployConfig, remote: R) -> Self {
        Self { config, remote }
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// `bouncer-2.3.1.jar` → `2.3.1`
    pub fn convert_to_version(&self, filename: &str) -> Option<String> {
        convert_to_version(&self.config.app, filename)
    }

    /// Resolve `current.jar` to the artifact it points at.
    ///
    /// Fails with a [`PointerError`] (reachable via `downcast_ref`) when the
    /// link is absent or its target is gone.
    pub fn current_filename(&self) -> anyhow::Result<PathBuf> {
        let link = self.config.current_link();
        let target = self
            .remote
            .read_link(&link)?
            .ok_or_else(|| PointerError::Missing { link: link.clone() })?;

        let resolved = resolve_link_target(&link, &target);
        if !self.remote.exists(&resolved)? {
            return Err(PointerError::Dangling {
                link,
                target: resolved,
            }
            .into());
        }
        Ok(resolved)
    }

    /// Copy the artifact into the root as the service user.
    ///
    /// Returns the deployed path. The pointer is left untouched.
    pub fn stage(&self, artifact_path: &Path) -> anyhow::Result<PathBuf> {
        let artifact = Artifact::from_path(&self.config.app, artifact_path)?;
        if !artifact.path().is_file() {
            anyhow::bail!("Artifact not found: {}", artifact.path().display());
        }
        let dest = self.config.deploy_path(artifact.path())?;

        tracing::info!(
            app = %self.config.app,
            version = artifact.version(),
            host = %self.remote.describe(),
            "Staging {} into {}",
            self.config.app,
            self.config.root.display()
        );

        let uploaded = self
            .remote
            .upload(artifact.path(), &self.config.temp_dir)
            .with_context(|| format!("Failed to upload {}", artifact.path().display()))?;

        let copied = self
            .remote
            .copy(
                &Privilege::user(&self.config.service_user),
                &uploaded,
                &dest,
            )
            .with_context(|| format!("Failed to stage {}", dest.display()));

        self.discard_upload(&uploaded);
        copied?;

        Ok(dest)
    }

    /// Point `current.jar` at the staged copy of `artifact_path`.
    ///
    /// Only the file name of `artifact_path` matters; the artifact must have
    /// been staged already. Returns the deployed path now referenced.
    pub fn install(&self, artifact_path: &Path) -> anyhow::Result<PathBuf> {
        let artifact = Artifact::from_path(&self.config.app, artifact_path)?;
        let deployed = self.config.deploy_path(artifact.path())?;
        if !self.remote.exists(&deployed)? {
            anyhow::bail!(
                "{} has not been staged on {}; run stage first",
                deployed.display(),
                self.remote.describe()
            );
        }

        tracing::info!(
            "Installing new {} into {}",
            self.config.app,
            self.config.current_link().display()
        );
        self.switch_current(&deployed)?;
        Ok(deployed)
    }

    /// Point `current.jar` at an already-installed version.
    pub fn activate(&self, version: &str) -> anyhow::Result<PathBuf> {
        let path = self.config.installed_path(version);
        if !self.remote.exists(&path)? {
            anyhow::bail!(
                "Version {} is not installed ({} missing on {})",
                version,
                path.display(),
                self.remote.describe()
            );
        }

        tracing::info!(
            "Activating {} {} via {}",
            self.config.app,
            version,
            self.config.current_link().display()
        );
        self.switch_current(&path)?;
        Ok(path)
    }

    /// Run the service restart command as root.
    pub fn restart(&self) -> anyhow::Result<CommandOutput> {
        tracing::info!("Restarting {}", self.config.app);
        self.remote
            .run(&Privilege::Root, &self.config.restart_command)
            .with_context(|| format!("Failed to restart {}", self.config.app))
    }

    /// Every installed artifact, oldest first, with the current one flagged.
    pub fn installed_versions(&self) -> anyhow::Result<Vec<InstalledArtifact>> {
        let current = self.current_filename()?;
        self.list_installed(&Privilege::Login, &current)
    }

    /// Work out which artifacts a clean would delete.
    pub fn plan_clean(&self) -> anyhow::Result<CleanPlan> {
        let current = self.current_filename()?;
        let candidates: Vec<InstalledArtifact> = self
            .list_installed(&Privilege::Root, &current)?
            .into_iter()
            .filter(|artifact| !artifact.current)
            .collect();

        let (remove, keep) = split_for_clean(candidates, self.config.keep);
        Ok(CleanPlan {
            current,
            remove,
            keep,
        })
    }

    /// Delete what `plan` marks for removal, as root.
    pub fn apply_clean(&self, plan: &CleanPlan) -> anyhow::Result<CleanReport> {
        let kept = plan.keep.iter().map(|a| a.file_name.clone()).collect();
        if plan.is_empty() {
            tracing::info!("No cleanable versions installed.");
            return Ok(CleanReport {
                deleted: Vec::new(),
                kept,
            });
        }

        let paths: Vec<PathBuf> = plan.remove.iter().map(|a| a.path.clone()).collect();
        for artifact in &plan.remove {
            tracing::info!(file = %artifact.file_name, "Removing old installed version");
        }
        self.remote
            .remove(&Privilege::Root, &paths)
            .context("Failed to remove old installed versions")?;

        Ok(CleanReport {
            deleted: plan.remove.iter().map(|a| a.file_name.clone()).collect(),
            kept,
        })
    }

    /// Keep the newest `keep` non-current artifacts and delete the rest.
    pub fn clean_installed(&self) -> anyhow::Result<CleanReport> {
        let plan = self.plan_clean()?;
        self.apply_clean(&plan)
    }

    /// Write the installed versions, highlighting the current one.
    pub fn print_installed_versions<W: Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        let installed = self.installed_versions()?;
        writeln!(writer, "Installed versions:")?;
        for artifact in &installed {
            if artifact.current {
                writeln!(
                    writer,
                    "   {} {}",
                    style("*").bold(),
                    style(&artifact.version).bold().underlined()
                )?;
            } else {
                writeln!(writer, "     {}", artifact.version)?;
            }
        }
        Ok(())
    }

    /// Stage, install and restart, in that order.
    pub fn run(&self, artifact_path: &Path) -> anyhow::Result<RunReport> {
        let staged = self.stage(artifact_path)?;
        let installed = self.install(artifact_path)?;
        let restart = self.restart()?;
        Ok(RunReport {
            staged,
            installed,
            restart,
        })
    }

    fn switch_current(&self, target: &Path) -> anyhow::Result<()> {
        let link = self.config.current_link();
        self.remote
            .symlink(&Privilege::Root, target, &link)
            .with_context(|| format!("Failed to point {} at {}", link.display(), target.display()))
    }

    fn list_installed(
        &self,
        privilege: &Privilege,
        current: &Path,
    ) -> anyhow::Result<Vec<InstalledArtifact>> {
        let paths = self.remote.glob(
            privilege,
            &self.config.root,
            &self.config.artifact_pattern(),
        )?;

        let mut installed = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string)
            else {
                continue;
            };
            let Some(version) = self.convert_to_version(&file_name) else {
                tracing::warn!(file = %file_name, "Skipping artifact without a version");
                continue;
            };
            installed.push(InstalledArtifact {
                current: path == current,
                path,
                file_name,
                version,
            });
        }

        sort_installed(self.config.version_order, &mut installed);
        Ok(installed)
    }

    fn discard_upload(&self, uploaded: &Path) {
        if let Err(err) = self
            .remote
            .remove(&Privilege::Login, &[uploaded.to_path_buf()])
        {
            tracing::warn!(path = %uploaded.display(), "Failed to remove upload: {err:#}");
            return;
        }
        if let Some(dir) = uploaded.parent()
            && let Err(err) = self.remote.remove_dir(&Privilege::Login, dir)
        {
            tracing::warn!(path = %dir.display(), "Failed to remove upload directory: {err:#}");
        }
    }
}
