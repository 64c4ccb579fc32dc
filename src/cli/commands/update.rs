//! Update command implementation.
//!
//! `envy update` upgrades pip and then every installed package.

use std::path::PathBuf;

use crate::cli::args::TargetArgs;
use crate::environment::VenvLayout;
use crate::error::Result;
use crate::reconcile::Reconciler;
use crate::tooling::PackageManager;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::toolkit::{ensure_environment, ResolvedTarget, Toolkit};

/// Upgrade everything in the environment at `layout`, returning how many
/// packages were upgraded.
pub fn upgrade_environment(
    reconciler: &Reconciler<'_>,
    manager: &dyn PackageManager,
    layout: &VenvLayout,
    ui: &mut dyn UserInterface,
) -> Result<usize> {
    ensure_environment(reconciler, layout, ui)?;

    let mut spinner = ui.start_spinner("Upgrading packages");
    match manager.upgrade_all(layout) {
        Ok(count) => {
            spinner.finish_success(&format!("Upgraded {} package(s)", count));
            Ok(count)
        }
        Err(e) => {
            spinner.finish_error("Upgrade failed");
            Err(e)
        }
    }
}

/// The update command implementation.
pub struct UpdateCommand {
    args: TargetArgs,
    config_override: Option<PathBuf>,
}

impl UpdateCommand {
    pub fn new(args: TargetArgs, config_override: Option<PathBuf>) -> Self {
        Self {
            args,
            config_override,
        }
    }
}

impl Command for UpdateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let target = ResolvedTarget::resolve(&self.args)?;
        let toolkit = Toolkit::load(target.app_dir(), self.config_override.as_deref())?;
        let layout = toolkit.layout(&target);

        upgrade_environment(&toolkit.reconciler(), toolkit.packages(), &layout, ui)?;
        Ok(CommandResult::success())
    }
}
