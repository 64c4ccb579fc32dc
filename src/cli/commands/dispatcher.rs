//! Routing from parsed CLI arguments to [`Command`] implementations.

use std::path::PathBuf;

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::error::{EnvyError, Result};
use crate::guard::InvocationContext;
use crate::tooling::PackageOperation;
use crate::ui::UserInterface;

use super::completions::CompletionsCommand;
use super::delete::DeleteCommand;
use super::packages::PackagesCommand;
use super::recreate::RecreateCommand;
use super::run::RunCommand;
use super::status::StatusCommand;
use super::sync::SyncCommand;
use super::update::UpdateCommand;

/// One subcommand, ready to run.
pub trait Command {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Outcome of a command: the process exit code and whether it counts as
/// success.
#[derive(Debug)]
pub struct CommandResult {
    pub success: bool,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success() -> Self {
        Self::from_exit_code(0)
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Mirror a launched script's exit code.
    pub fn from_exit_code(exit_code: i32) -> Self {
        Self {
            success: exit_code == 0,
            exit_code,
        }
    }
}

/// Builds the command for a parsed [`Cli`] and runs it.
pub struct CommandDispatcher {
    context: InvocationContext,
    config_override: Option<PathBuf>,
}

impl CommandDispatcher {
    /// `context` is the guard state read once at startup.
    pub fn new(context: InvocationContext, config_override: Option<PathBuf>) -> Self {
        Self {
            context,
            config_override,
        }
    }

    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(command) => self.command_for(command)?.execute(ui),
            None => {
                ui.error("No script given. Usage: envy <SCRIPT> [ARGS]... (see envy --help)");
                Ok(CommandResult::failure(2))
            }
        }
    }

    fn command_for(&self, command: &Commands) -> Result<Box<dyn Command>> {
        let config = self.config_override.clone();
        let command: Box<dyn Command> = match command {
            Commands::Run(args) => {
                Box::new(RunCommand::new(args.clone(), self.context.clone(), config))
            }
            Commands::External(argv) => Box::new(RunCommand::new(
                external_run_args(argv)?,
                self.context.clone(),
                config,
            )),
            Commands::Sync(args) => Box::new(SyncCommand::new(args.clone(), config)),
            Commands::Status(args) => Box::new(StatusCommand::new(args.clone(), config)),
            Commands::Recreate(args) => Box::new(RecreateCommand::new(args.clone(), config)),
            Commands::Delete(args) => Box::new(DeleteCommand::new(args.clone(), config)),
            Commands::Install(args) => Box::new(PackagesCommand::new(
                PackageOperation::Install,
                args.clone(),
                config,
            )),
            Commands::Uninstall(args) => Box::new(PackagesCommand::new(
                PackageOperation::Uninstall,
                args.clone(),
                config,
            )),
            Commands::Update(args) => Box::new(UpdateCommand::new(args.clone(), config)),
            Commands::Completions(args) => Box::new(CompletionsCommand::new(args.clone())),
        };
        Ok(command)
    }
}

/// `envy SCRIPT ARGS...`: the first element is the script.
fn external_run_args(argv: &[std::ffi::OsString]) -> Result<RunArgs> {
    let (script, args) = argv
        .split_first()
        .ok_or_else(|| EnvyError::Other(anyhow::anyhow!("No script given")))?;
    Ok(RunArgs::for_script(PathBuf::from(script), args.to_vec()))
}
