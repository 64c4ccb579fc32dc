//! Sync command implementation.
//!
//! `envy sync SCRIPT` reconciles the environment without launching.

use std::path::PathBuf;

use crate::cli::args::SyncArgs;
use crate::error::Result;
use crate::guard::InvocationContext;
use crate::launcher::{LaunchRequest, Launcher, SystemRunner};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::toolkit::{requirement_sources, Toolkit};

/// The sync command implementation.
pub struct SyncCommand {
    args: SyncArgs,
    config_override: Option<PathBuf>,
}

impl SyncCommand {
    pub fn new(args: SyncArgs, config_override: Option<PathBuf>) -> Self {
        Self {
            args,
            config_override,
        }
    }
}

impl Command for SyncCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let toolkit = Toolkit::for_script(&self.args.script, self.config_override.as_deref())?;
        let scanner = toolkit.scanner(self.args.reconcile.pipreqs);
        let reconciler = toolkit.reconciler();
        let launcher = Launcher::new(
            InvocationContext::fresh(),
            &scanner,
            &reconciler,
            &SystemRunner,
            toolkit.venv_home().to_path_buf(),
        );
        let request = LaunchRequest {
            script: self.args.script.clone(),
            venv: self.args.reconcile.venv.clone(),
            sources: requirement_sources(&self.args.reconcile),
            options: toolkit.options(&self.args.reconcile),
            ..Default::default()
        };

        let (app, layout, outcome) = launcher.prepare(&request, ui)?;
        if outcome.was_noop() {
            ui.success(&format!(
                "{} is up to date ({})",
                app.env_id(),
                layout.root().display()
            ));
        } else {
            ui.success(&format!(
                "Synced {} ({} package(s) required)",
                app.env_id(),
                app.requirements().len()
            ));
        }
        Ok(CommandResult::success())
    }
}
