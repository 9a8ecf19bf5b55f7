//! Jarlift - versioned jar deployment
//!
//! Usage:
//!   jarlift deploy build/bouncer-2.3.1.jar   # stage, install, restart
//!   jarlift versions                         # list installed versions
//!   jarlift clean                            # prune old versions
//!   jarlift --local --root /srv/app ...      # operate on this machine

mod interactive;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jarlift_core::config::parser::to_toml;
use jarlift_core::config::{ConfigFile, ConfigStore, SshSection, Transport};
use jarlift_core::prelude::{DeployConfig, DeployTask, LocalRemote, Remote, SshRemote};
use jarlift_core::version::VersionOrder;

use crate::interactive::ConfirmFlow;

#[derive(Parser)]
#[command(name = "jarlift")]
#[command(about = "Deploy versioned jars behind a current.jar symlink", long_about = None)]
struct Cli {
    /// Config file (defaults to ./jarlift.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Target host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Application name
    #[arg(long, global = true)]
    app: Option<String>,

    /// Installation root (defaults to /opt/<app>)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Old versions kept by clean
    #[arg(long, global = true)]
    keep: Option<usize>,

    /// Login user for ssh
    #[arg(long, global = true)]
    user: Option<String>,

    /// Ssh port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Ssh identity file
    #[arg(long, global = true)]
    identity: Option<PathBuf>,

    /// Account that owns staged artifacts
    #[arg(long, global = true)]
    service_user: Option<String>,

    /// Version ordering used by versions and clean
    #[arg(long, global = true)]
    order: Option<VersionOrder>,

    /// Operate on this machine instead of over ssh
    #[arg(long, global = true)]
    local: bool,

    /// Log every remote command
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage, install and restart
    Deploy {
        /// Local artifact, named <app>-<version>.jar
        artifact: PathBuf,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Copy the artifact into the installation root
    Stage {
        artifact: PathBuf,
    },

    /// Point current.jar at a staged artifact
    Install {
        artifact: PathBuf,
    },

    /// Point current.jar at an installed version
    Activate {
        version: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Run the restart command
    Restart,

    /// Delete old installed versions
    Clean {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List installed versions
    #[command(alias = "ls")]
    Versions {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the resolved configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

impl Cli {
    /// Flags layered over the config file.
    fn overrides(&self) -> ConfigFile {
        ConfigFile {
            app: self.app.clone(),
            host: self.host.clone(),
            root: self.root.clone(),
            service_user: self.service_user.clone(),
            keep: self.keep,
            version_order: self.order,
            transport: self.local.then_some(Transport::Local),
            ssh: SshSection {
                user: self.user.clone(),
                port: self.port,
                identity_file: self.identity.clone(),
            },
            ..ConfigFile::default()
        }
    }

    fn store(&self) -> Result<ConfigStore> {
        match &self.config {
            Some(path) => ConfigStore::from_path(path),
            None => ConfigStore::discover(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "jarlift=debug,jarlift_core=debug,info"
    } else {
        "jarlift=info,jarlift_core=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = cli.store()?.resolve(cli.overrides())?;

    match config.transport {
        Transport::Ssh => {
            let remote = SshRemote::from_config(&config)?;
            run_command(DeployTask::new(config, remote), cli.command)
        }
        Transport::Local => run_command(DeployTask::new(config, LocalRemote::new()), cli.command),
    }
}

fn run_command<R: Remote>(task: DeployTask<R>, command: Commands) -> Result<()> {
    match command {
        Commands::Deploy { artifact, yes } => run_deploy(&task, &artifact, yes),
        Commands::Stage { artifact } => {
            let staged = task.stage(&artifact)?;
            println!(
                "✓ Staged {} on {}",
                style(staged.display()).bold(),
                task.remote().describe()
            );
            Ok(())
        }
        Commands::Install { artifact } => {
            let installed = task.install(&artifact)?;
            print_switched(task.config(), &installed);
            Ok(())
        }
        Commands::Activate { version, yes } => {
            let mut flow = ConfirmFlow::new(yes);
            if !flow.confirm_activate(task.config(), &version)? {
                println!("Aborted.");
                return Ok(());
            }
            let installed = task.activate(&version)?;
            print_switched(task.config(), &installed);
            Ok(())
        }
        Commands::Restart => {
            let output = task.restart()?;
            print_command_output(&output.stdout);
            println!("✓ Restarted {}", task.config().app);
            Ok(())
        }
        Commands::Clean { yes, format } => run_clean(&task, yes, format),
        Commands::Versions { format } => match format {
            OutputFormat::Table => task.print_installed_versions(&mut io::stdout()),
            OutputFormat::Json => {
                let installed = task.installed_versions()?;
                println!("{}", serde_json::to_string_pretty(&installed)?);
                Ok(())
            }
        },
        Commands::Config => {
            print!("{}", to_toml(task.config())?);
            Ok(())
        }
    }
}

fn run_deploy<R: Remote>(task: &DeployTask<R>, artifact: &Path, yes: bool) -> Result<()> {
    let name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| artifact.display().to_string());

    let mut flow = ConfirmFlow::new(yes);
    if !flow.confirm_deploy(task.config(), &task.remote().describe(), &name)? {
        println!("Aborted.");
        return Ok(());
    }

    let report = task.run(artifact)?;
    print_command_output(&report.restart.stdout);
    println!(
        "✓ Deployed {} to {}",
        style(&name).bold(),
        task.remote().describe()
    );
    println!("  Path:    {}", report.staged.display());
    println!("  Current: {}", task.config().current_link().display());
    Ok(())
}

fn run_clean<R: Remote>(task: &DeployTask<R>, yes: bool, format: OutputFormat) -> Result<()> {
    let plan = task.plan_clean()?;

    if matches!(format, OutputFormat::Table) {
        let mut flow = ConfirmFlow::new(yes);
        if !flow.confirm_clean(&plan)? {
            println!("Aborted.");
            return Ok(());
        }
    } else if !yes && !plan.is_empty() {
        anyhow::bail!("JSON output cannot prompt; pass --yes to delete old versions");
    }

    let report = task.apply_clean(&plan)?;
    match format {
        OutputFormat::Table => {
            if report.deleted.is_empty() {
                println!("No cleanable versions installed.");
            } else {
                println!(
                    "✓ Removed {} old version{}",
                    report.deleted.len(),
                    if report.deleted.len() == 1 { "" } else { "s" }
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn print_switched(config: &DeployConfig, target: &Path) {
    println!(
        "✓ {} -> {}",
        config.current_link().display(),
        style(target.display()).bold()
    );
}

fn print_command_output(stdout: &str) {
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        println!("  {}", style(line).dim());
    }
}
