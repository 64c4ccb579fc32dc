//! Run command implementation.
//!
//! `envy run SCRIPT [ARGS]...` (or just `envy SCRIPT [ARGS]...`) reconciles
//! the script's environment and hands control to its interpreter.

use std::path::PathBuf;

use crate::cli::args::RunArgs;
use crate::error::Result;
use crate::guard::InvocationContext;
use crate::launcher::{LaunchRequest, Launcher, SystemRunner};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::toolkit::{requirement_sources, Toolkit};

/// The run command implementation.
pub struct RunCommand {
    args: RunArgs,
    context: InvocationContext,
    config_override: Option<PathBuf>,
}

impl RunCommand {
    pub fn new(args: RunArgs, context: InvocationContext, config_override: Option<PathBuf>) -> Self {
        Self {
            args,
            context,
            config_override,
        }
    }

    /// Launch request for these arguments.
    pub fn request(&self, toolkit: &Toolkit) -> LaunchRequest {
        LaunchRequest {
            script: self.args.script.clone(),
            args: self.args.args.clone(),
            venv: self.args.reconcile.venv.clone(),
            sources: requirement_sources(&self.args.reconcile),
            options: toolkit.options(&self.args.reconcile),
        }
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let toolkit = Toolkit::for_script(&self.args.script, self.config_override.as_deref())?;
        let scanner = toolkit.scanner(self.args.reconcile.pipreqs);
        let reconciler = toolkit.reconciler();
        let launcher = Launcher::new(
            self.context.clone(),
            &scanner,
            &reconciler,
            &SystemRunner,
            toolkit.venv_home().to_path_buf(),
        );

        let code = launcher.launch(&self.request(&toolkit), ui)?;
        tracing::debug!("{} exited with {}", self.args.script.display(), code);
        Ok(CommandResult::from_exit_code(code))
    }
}
