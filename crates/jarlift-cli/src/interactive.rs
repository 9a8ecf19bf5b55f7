//! Confirmation prompts shown before commands that change the host.
//!
//! Prints a short summary of what is about to happen, then asks with
//! dialoguer unless `--yes` was given.

use std::io::{self, Write};

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};

use jarlift_core::deploy::CleanPlan;
use jarlift_core::prelude::DeployConfig;

/// Summary-then-confirm flow.
pub struct ConfirmFlow<W: Write = io::Stdout> {
    /// Skip the prompt and answer yes
    yes: bool,
    /// Output writer (for testing)
    writer: W,
    /// Theme for dialoguer prompts
    theme: ColorfulTheme,
}

impl ConfirmFlow<io::Stdout> {
    pub fn new(yes: bool) -> Self {
        Self {
            yes,
            writer: io::stdout(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl<W: Write> ConfirmFlow<W> {
    /// Create a flow with a custom writer (for testing).
    #[cfg(test)]
    pub fn with_writer(yes: bool, writer: W) -> Self {
        Self {
            yes,
            writer,
            theme: ColorfulTheme::default(),
        }
    }

    /// Summarize a full deploy and ask to proceed.
    pub fn confirm_deploy(
        &mut self,
        config: &DeployConfig,
        target: &str,
        artifact: &str,
    ) -> Result<bool> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style("  Deploy").bold())?;
        writeln!(self.writer, "  ───────────────────────────")?;
        writeln!(self.writer, "  App:      {}", style(&config.app).green())?;
        writeln!(self.writer, "  Host:     {}", style(target).green())?;
        writeln!(self.writer, "  Artifact: {}", style(artifact).green())?;
        writeln!(
            self.writer,
            "  Root:     {}",
            style(config.root.display()).green()
        )?;
        writeln!(
            self.writer,
            "  Restart:  {}",
            style(&config.restart_command).green()
        )?;
        writeln!(self.writer)?;

        self.ask("Stage, install and restart?")
    }

    /// List what a clean would delete and ask to proceed.
    ///
    /// An empty plan needs no confirmation.
    pub fn confirm_clean(&mut self, plan: &CleanPlan) -> Result<bool> {
        if plan.is_empty() {
            return Ok(true);
        }

        writeln!(self.writer, "Removing old installed versions: ")?;
        for artifact in &plan.remove {
            writeln!(self.writer, "   * {}", artifact.file_name)?;
        }
        writeln!(self.writer)?;

        self.ask("Delete these files?")
    }

    /// Confirm switching the pointer to an existing version.
    pub fn confirm_activate(&mut self, config: &DeployConfig, version: &str) -> Result<bool> {
        writeln!(
            self.writer,
            "Switching {} to {} {}",
            config.current_link().display(),
            config.app,
            style(version).bold()
        )?;

        self.ask("Proceed?")
    }

    fn ask(&mut self, prompt: &str) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }
        if !console::user_attended() {
            anyhow::bail!("Refusing to prompt without a terminal; pass --yes to proceed");
        }

        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        Ok(confirmed)
    }
}
