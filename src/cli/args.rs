//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::CONFIG_ENV_VAR;

/// envy - run Python scripts in self-reconciling virtual environments.
#[derive(Debug, Parser)]
#[command(name = "envy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(allow_external_subcommands = true)]
pub struct Cli {
    /// Path to the user config file (overrides ~/.envy/config.yml)
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile the script's environment and run it
    Run(RunArgs),

    /// Reconcile the script's environment without running it
    Sync(SyncArgs),

    /// Show the environment state and pending changes
    Status(StatusArgs),

    /// Delete and rebuild an environment
    Recreate(RecreateArgs),

    /// Delete an environment
    Delete(DeleteArgs),

    /// Install packages into an environment
    Install(PackagesArgs),

    /// Uninstall packages from an environment
    Uninstall(PackagesArgs),

    /// Upgrade pip and every installed package
    Update(TargetArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),

    /// `envy SCRIPT [ARGS]...` is shorthand for `envy run SCRIPT [ARGS]...`
    #[command(external_subcommand)]
    External(Vec<OsString>),
}

/// Where requirements come from and how they are applied.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ReconcileArgs {
    /// Use this environment directory instead of the derived one
    #[arg(long, value_name = "DIR")]
    pub venv: Option<PathBuf>,

    /// Uninstall packages the script no longer needs
    #[arg(long)]
    pub prune: bool,

    /// Rebuild the environment from scratch first
    #[arg(long)]
    pub recreate: bool,

    /// Also install the entries of a requirements file
    #[arg(short, long, value_name = "FILE")]
    pub requirements: Option<PathBuf>,

    /// Ask pipreqs for requirements the import scan missed
    #[arg(long)]
    pub pipreqs: bool,

    /// Skip the import scan
    #[arg(long)]
    pub no_scan: bool,
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub reconcile: ReconcileArgs,

    /// Python script to run
    pub script: PathBuf,

    /// Arguments passed to the script unchanged
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<OsString>,
}

impl RunArgs {
    /// Run `script` with default options.
    pub fn for_script(script: PathBuf, args: Vec<OsString>) -> Self {
        Self {
            reconcile: ReconcileArgs::default(),
            script,
            args,
        }
    }
}

/// Arguments for the `sync` command.
#[derive(Debug, Clone, clap::Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub reconcile: ReconcileArgs,

    /// Python script whose environment is reconciled
    pub script: PathBuf,
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, clap::Args)]
pub struct StatusArgs {
    /// Python script to inspect
    pub script: PathBuf,

    /// Use this environment directory instead of the derived one
    #[arg(long, value_name = "DIR")]
    pub venv: Option<PathBuf>,

    /// Compare against a full prune instead of additive sync
    #[arg(long)]
    pub prune: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Selects an environment by application, by directory, or both: `--app`
/// with `--venv` is the application's environment kept at that directory.
#[derive(Debug, Clone, Default, clap::Args)]
#[group(required = true, multiple = true)]
pub struct TargetArgs {
    /// Environment of this Python script
    #[arg(long, value_name = "SCRIPT")]
    pub app: Option<PathBuf>,

    /// Environment at this directory
    #[arg(long, value_name = "DIR")]
    pub venv: Option<PathBuf>,
}

/// Arguments for the `recreate` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RecreateArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Also install the entries of this requirements file (with `--app`)
    #[arg(short = 'r', long = "requirements", value_name = "FILE")]
    pub requirements: Option<PathBuf>,

    /// Consult pipreqs for extra requirements (with `--app`)
    #[arg(long)]
    pub pipreqs: bool,
}

/// Arguments for the `delete` command.
#[derive(Debug, Clone, clap::Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `install` and `uninstall`.
#[derive(Debug, Clone, clap::Args)]
pub struct PackagesArgs {
    /// Package specifiers, e.g. `numpy` or `requests>=2`
    #[arg(required = true, value_name = "PKG")]
    pub packages: Vec<String>,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
